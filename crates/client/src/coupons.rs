//! Remote coupon validation.
//!
//! The backend owns every coupon rule (expiry, minimum purchase, usage
//! limits). This module only ships the code and a projection of the cart to
//! it and carries the verdict back.

use bazaar_core::{AppliedCoupon, CouponLine};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::http::ApiClient;

/// Message surfaced when the backend gives no reason of its own.
pub const FALLBACK_MESSAGE: &str = "Failed to apply coupon";

/// Why a coupon could not be applied.
///
/// Every variant carries a message fit for display; the cart stores it as its
/// coupon error regardless of the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    /// The backend rejected the code (expired, unknown, limit reached,
    /// minimum purchase not met).
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached or failed.
    #[error("{0}")]
    Unavailable(String),

    /// The session was rejected; the logout hook has already run.
    #[error("{0}")]
    SessionExpired(String),
}

/// Body of a validation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRequest {
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cart_total: Decimal,
    pub cart_items: Vec<CouponLine>,
}

/// Successful validation response.
#[derive(Debug, Deserialize)]
struct CouponGrant {
    code: String,
    #[serde(with = "rust_decimal::serde::float")]
    discount: Decimal,
}

impl From<CouponGrant> for AppliedCoupon {
    fn from(grant: CouponGrant) -> Self {
        Self {
            code: grant.code,
            discount: grant.discount,
        }
    }
}

/// Something that can check a coupon code against cart contents.
pub trait CouponValidator: Send + Sync {
    /// Validate `request.code`, returning the coupon as the server echoes it.
    fn validate(
        &self,
        request: &CouponRequest,
    ) -> impl Future<Output = Result<AppliedCoupon, CouponError>> + Send;
}

/// Validator backed by the REST API.
#[derive(Debug, Clone)]
pub struct RemoteCouponValidator {
    api: ApiClient,
    path: String,
}

impl RemoteCouponValidator {
    /// Validate against `path` (relative to the client's base URL).
    #[must_use]
    pub fn new(api: ApiClient, path: impl Into<String>) -> Self {
        Self {
            api,
            path: path.into(),
        }
    }
}

impl CouponValidator for RemoteCouponValidator {
    #[instrument(skip(self, request), fields(code = %request.code))]
    async fn validate(&self, request: &CouponRequest) -> Result<AppliedCoupon, CouponError> {
        match self.api.post::<_, CouponGrant>(&self.path, request).await {
            Ok(response) => {
                let coupon = AppliedCoupon::from(response.data);
                info!(code = %coupon.code, discount = %coupon.discount, "Coupon accepted");
                Ok(coupon)
            }
            Err(err) => Err(classify(err)),
        }
    }
}

/// Map a transport-level failure onto the coupon taxonomy.
fn classify(err: ApiError) -> CouponError {
    match err {
        ApiError::Unauthorized { message } => {
            CouponError::SessionExpired(message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()))
        }
        ApiError::Status { status, message } if is_rejection(status) => {
            let message = message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
            info!(status = %status, reason = %message, "Coupon rejected");
            CouponError::Rejected(message)
        }
        ApiError::Status { status, message } => {
            warn!(status = %status, message = ?message, "Coupon validation failed upstream");
            CouponError::Unavailable(message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()))
        }
        other => {
            warn!(error = %other, "Coupon validation request failed");
            CouponError::Unavailable(FALLBACK_MESSAGE.to_string())
        }
    }
}

/// Whether a status means the code itself was refused.
#[must_use]
pub fn is_rejection(status: StatusCode) -> bool {
    status.is_client_error() && status != StatusCode::UNAUTHORIZED
}
