//! Saved-for-later products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::types::ProductId;

/// A product saved to the wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub price: Decimal,
}

impl From<&CartItem> for WishlistItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product: item.product.clone(),
            name: item.name.clone(),
            image: item.image.clone(),
            price: item.price,
        }
    }
}

/// Ordered set of wishlist items, unique by product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Save an item. Returns `false` if the product was already saved.
    pub fn add(&mut self, item: WishlistItem) -> bool {
        if self.contains(&item.product) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Returns `false` if the product was not saved.
    pub fn remove(&mut self, product: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product != product);
        self.items.len() != before
    }

    /// Add if absent, remove if present. Returns whether it is now saved.
    pub fn toggle(&mut self, item: WishlistItem) -> bool {
        if self.remove(&item.product) {
            false
        } else {
            self.items.push(item);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, product: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product == product)
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
