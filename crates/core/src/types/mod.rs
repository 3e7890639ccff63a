//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod checkout;
pub mod id;
pub mod price;

pub use checkout::{PaymentMethod, ShippingAddress};
pub use id::{ProductId, ProductIdError};
pub use price::{CurrencyCode, Price};
