//! Wishlist commands.

use std::io::Write;
use std::path::Path;

use bazaar_core::{ProductId, WishlistItem};
use bazaar_storefront::Snapshot;

use super::{CommandError, edit};

pub async fn list(file: &Path) -> Result<(), CommandError> {
    let snapshot = Snapshot::load(file).await?;
    let mut out = std::io::stdout().lock();

    if snapshot.wishlist.is_empty() {
        writeln!(out, "Wishlist is empty")?;
    }
    for item in snapshot.wishlist.items() {
        writeln!(out, "{:<16} {:<24} {:>10}", item.product.as_str(), item.name, item.price)?;
    }
    Ok(())
}

pub async fn add(file: &Path, item: WishlistItem) -> Result<(), CommandError> {
    let product = item.product.clone();
    let added = edit(file, |s| Ok(s.wishlist.add(item))).await?;
    if !added {
        tracing::info!(product = %product, "Already in wishlist");
    }
    Ok(())
}

/// Save a product that is currently in the cart, copying its details.
pub async fn save_from_cart(file: &Path, product: &ProductId) -> Result<(), CommandError> {
    edit(file, |s| {
        let item = s
            .cart
            .item(product)
            .map(WishlistItem::from)
            .ok_or_else(|| CommandError::NotInCart(product.clone()))?;
        s.wishlist.add(item);
        Ok(())
    })
    .await
}

pub async fn remove(file: &Path, product: &ProductId) -> Result<(), CommandError> {
    let removed = edit(file, |s| Ok(s.wishlist.remove(product))).await?;
    if !removed {
        tracing::info!(product = %product, "Not in wishlist");
    }
    Ok(())
}
