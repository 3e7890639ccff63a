//! Coupon commands.
//!
//! # Environment Variables
//!
//! `coupon apply` reads the backend client configuration:
//! - `BAZAAR_API_URL` - Base URL of the backend REST API
//! - `BAZAAR_API_TOKEN` - Optional bearer token
//! - `BAZAAR_COUPON_PATH` - Coupon validation endpoint (default: `coupons/validate`)

use std::io::Write;
use std::path::Path;

use bazaar_client::{ApiClient, ClientConfig, RemoteCouponValidator};
use bazaar_storefront::{CartStore, Snapshot};

use super::{CommandError, edit};

/// Validate `code` against the cart in `file` and record the result.
///
/// The snapshot is saved whether or not the coupon was accepted, so a
/// rejection also clears a previously applied coupon on disk.
pub async fn apply(file: &Path, code: &str) -> Result<(), CommandError> {
    let config = ClientConfig::from_env()?;
    tracing::debug!(?config, "Loaded client configuration");

    let api = ApiClient::new(&config)?;
    api.session()
        .set_logout_hook(|| tracing::warn!("Backend rejected the API token; it has been dropped"))
        .await;
    let validator = RemoteCouponValidator::new(api, config.coupon_path.clone());

    let mut snapshot = Snapshot::load(file).await?;
    let store = CartStore::with_state(validator, snapshot.cart.clone());

    let result = store.apply_coupon_to_cart(code).await;

    snapshot.cart = store.snapshot();
    snapshot.save(file).await?;

    let discount = result?;
    let applied = snapshot
        .cart
        .coupon()
        .map_or_else(|| code.to_string(), |coupon| coupon.code.clone());
    writeln!(
        std::io::stdout().lock(),
        "Coupon {applied} applied: -{discount} (total {})",
        snapshot.cart.grand_total()
    )?;
    Ok(())
}

pub async fn remove(file: &Path) -> Result<(), CommandError> {
    edit(file, |s| {
        s.cart.remove_coupon();
        Ok(())
    })
    .await?;
    tracing::info!("Coupon removed");
    Ok(())
}
