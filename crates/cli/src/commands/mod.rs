//! Command implementations.
//!
//! Every command loads the snapshot file, applies one change and saves it
//! back. Read-only commands skip the save.

pub mod cart;
pub mod coupon;
pub mod wishlist;

use std::path::Path;

use bazaar_client::{ApiError, ConfigError, CouponError};
use bazaar_core::{MutationOutcome, ProductId};
use bazaar_storefront::{Snapshot, SnapshotError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    #[error("Coupon not applied: {0}")]
    Coupon(#[from] CouponError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Product not in cart: {0}")]
    NotInCart(ProductId),
}

/// Load, change and save the snapshot at `file`.
async fn edit<R>(
    file: &Path,
    change: impl FnOnce(&mut Snapshot) -> Result<R, CommandError>,
) -> Result<R, CommandError> {
    let mut snapshot = Snapshot::load(file).await?;
    let result = change(&mut snapshot)?;
    snapshot.save(file).await?;
    Ok(result)
}

/// One-line description of what a line mutation did.
fn describe(product: &ProductId, outcome: MutationOutcome) -> String {
    match outcome {
        MutationOutcome::Applied => format!("{product}: updated"),
        MutationOutcome::ClampedToStock { requested, granted } => {
            format!("{product}: only {granted} in stock ({requested} requested)")
        }
        MutationOutcome::Removed => format!("{product}: removed"),
        MutationOutcome::ItemNotFound => format!("{product}: not in cart"),
        MutationOutcome::OutOfStock => format!("{product}: out of stock, not added"),
        MutationOutcome::Unchanged => format!("{product}: nothing to change"),
    }
}
