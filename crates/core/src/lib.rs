//! Bazaar Core - Shared client state types.
//!
//! This crate provides the state models used by every Bazaar front-end:
//! - `storefront` - State containers handed to UI call sites
//! - `client` - HTTP plumbing and the remote coupon validator
//! - `cli` - Command-line driver over a saved cart
//!
//! # Architecture
//!
//! The core crate contains only types and synchronous state transitions - no
//! I/O, no locking, no HTTP clients. This keeps the cart rules testable in
//! isolation and usable anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product ids, prices and checkout details
//! - [`cart`] - Cart line items, derived totals and the coupon sub-state
//! - [`wishlist`] - Saved-for-later products

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;
pub mod wishlist;

pub use cart::{
    AppliedCoupon, CartItem, CartState, CouponLine, CouponStatus, MutationOutcome,
};
pub use types::*;
pub use wishlist::{Wishlist, WishlistItem};
