//! Shopping cart state.
//!
//! [`CartState`] is a plain value: every operation is a synchronous
//! transition that leaves the derived totals consistent before returning.
//! Locking and the remote coupon round-trip live in `bazaar-storefront`.

mod coupon;
mod item;
mod outcome;
mod state;

pub use coupon::{AppliedCoupon, CouponLine, CouponStatus};
pub use item::CartItem;
pub use outcome::MutationOutcome;
pub use state::CartState;
