//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// One line of the cart.
///
/// `price` and `count_in_stock` are snapshots taken when the line was added;
/// they are not re-validated against the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Catalog product, unique within a cart.
    pub product: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Unit price at the time the line was added.
    pub price: Decimal,
    pub quantity: u32,
    /// Stock ceiling supplied with the line.
    pub count_in_stock: u32,
}

impl CartItem {
    /// Create a line item without an image.
    #[must_use]
    pub fn new(
        product: ProductId,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
        count_in_stock: u32,
    ) -> Self {
        Self {
            product,
            name: name.into(),
            image: None,
            price,
            quantity,
            count_in_stock,
        }
    }

    /// Attach a display image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// `price * quantity`, saturating at the decimal range.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = CartItem::new(
            ProductId::parse("A").unwrap(),
            "Apron",
            Decimal::new(1250, 2),
            3,
            10,
        );
        assert_eq!(item.line_total(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_line_total_saturates() {
        let item = CartItem::new(ProductId::parse("A").unwrap(), "Gold", Decimal::MAX, 2, 5);
        assert_eq!(item.line_total(), Decimal::MAX);
    }

    #[test]
    fn test_wire_shape_uses_count_in_stock() {
        let json = serde_json::json!({
            "product": "A",
            "name": "Apron",
            "price": "10",
            "quantity": 2,
            "countInStock": 5
        });

        let item: CartItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.count_in_stock, 5);
        assert!(item.image.is_none());
    }
}
