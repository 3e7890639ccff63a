//! Shared wishlist store.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bazaar_core::{ProductId, Wishlist, WishlistItem};
use tracing::debug;

/// Wishlist shared between every part of the UI. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct WishlistStore {
    inner: Arc<RwLock<Wishlist>>,
}

impl WishlistStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_wishlist(wishlist: Wishlist) -> Self {
        Self {
            inner: Arc::new(RwLock::new(wishlist)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Wishlist> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Wishlist> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Save a product. Returns `false` if it was already saved.
    pub fn add(&self, item: WishlistItem) -> bool {
        let product = item.product.clone();
        let added = self.write().add(item);
        debug!(product = %product, added, "Wishlist add");
        added
    }

    /// Returns `false` if the product was not saved.
    pub fn remove(&self, product: &ProductId) -> bool {
        let removed = self.write().remove(product);
        debug!(product = %product, removed, "Wishlist remove");
        removed
    }

    /// Save the product if absent, otherwise remove it. Returns whether it is
    /// saved afterwards.
    pub fn toggle(&self, item: WishlistItem) -> bool {
        let product = item.product.clone();
        let saved = self.write().toggle(item);
        debug!(product = %product, saved, "Wishlist toggle");
        saved
    }

    #[must_use]
    pub fn contains(&self, product: &ProductId) -> bool {
        self.read().contains(product)
    }

    #[must_use]
    pub fn items(&self) -> Vec<WishlistItem> {
        self.read().items().to_vec()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    #[must_use]
    pub fn snapshot(&self) -> Wishlist {
        self.read().clone()
    }

    pub fn restore(&self, wishlist: Wishlist) {
        *self.write() = wishlist;
    }
}
