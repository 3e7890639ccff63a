//! Bazaar Storefront - client-side state containers.
//!
//! Each store is a cheaply cloneable handle; create one per session and pass
//! clones to whatever needs it.
//!
//! - [`CartStore`] - Cart lines, checkout details and coupon validation
//! - [`WishlistStore`] - Saved-for-later products
//! - [`Snapshot`] - JSON persistence of both between runs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod snapshot;
pub mod wishlist;

pub use cart::CartStore;
pub use snapshot::{Snapshot, SnapshotError};
pub use wishlist::WishlistStore;
