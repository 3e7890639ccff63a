//! Checkout details captured alongside the cart.
//!
//! Neither type is validated here; the backend owns address and payment
//! validation at order time.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Where an order should be shipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    /// Street address line.
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} {}, {}",
            self.address, self.city, self.postal_code, self.country
        )
    }
}

/// Selected payment method identifier (e.g. `"PayPal"`, `"Stripe"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    /// Identifier used until the customer picks one.
    pub const DEFAULT: &'static str = "PayPal";

    /// Create a payment method from its identifier.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self(method.into())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
