//! Coupon sub-state of the cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A coupon accepted by the validator.
///
/// Code and discount are stored together so one can never be set without
/// the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    /// Code as echoed by the server, which may differ in casing from input.
    pub code: String,
    pub discount: Decimal,
}

/// Where the coupon flow currently stands.
///
/// ```text
/// NoCoupon --apply--> Validating --ok--> Applied --remove--> NoCoupon
///                          |                 |
///                          +--err--> Failed  +--apply--> Validating
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponStatus {
    NoCoupon,
    Validating,
    Applied,
    /// No coupon applied and an error message retained.
    Failed,
}

/// The minimal projection of a cart line sent to the coupon validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponLine {
    pub product: ProductId,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}
