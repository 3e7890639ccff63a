//! Bazaar backend client.
//!
//! HTTP plumbing shared by the storefront state containers: configuration,
//! the bearer-token session, a generic REST client and the remote coupon
//! validator built on top of it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod coupons;
pub mod error;
pub mod http;
pub mod session;

pub use config::{ClientConfig, ConfigError};
pub use coupons::{
    CouponError, CouponRequest, CouponValidator, FALLBACK_MESSAGE, RemoteCouponValidator,
};
pub use error::ApiError;
pub use http::{ApiClient, ApiResponse};
pub use session::{LogoutHook, SessionStore};
