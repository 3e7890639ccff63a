//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_API_URL` - Base URL of the backend REST API (e.g. `https://shop.example/api/`)
//!
//! ## Optional
//! - `BAZAAR_API_TOKEN` - Bearer token to start the session with
//! - `BAZAAR_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `BAZAAR_COUPON_PATH` - Coupon validation endpoint, relative to the base URL
//!   (default: `coupons/validate`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default coupon validation path.
pub const DEFAULT_COUPON_PATH: &str = "coupons/validate";

/// Values that indicate a token was copied from a template and never filled in.
const PLACEHOLDER_TOKENS: &[&str] = &["changeme", "your-token", "placeholder", "xxx", "todo"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Backend client configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL every request path is resolved against. Always ends in `/`.
    pub base_url: Url,
    /// Initial bearer token, if the session is already authenticated.
    pub api_token: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Coupon validation endpoint, relative to `base_url`.
    pub coupon_path: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .field("coupon_path", &self.coupon_path)
            .field("sentry_dsn", &self.sentry_dsn)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration for `base_url` with every optional setting defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            coupon_path: DEFAULT_COUPON_PATH.to_string(),
            sentry_dsn: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the token looks like an unfilled placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("BAZAAR_API_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("BAZAAR_API_URL".to_string()))?;
        let mut config = Self::new(&base_url)?;

        if let Some(token) = lookup("BAZAAR_API_TOKEN").filter(|t| !t.trim().is_empty()) {
            let token = SecretString::from(token);
            validate_token(&token, "BAZAAR_API_TOKEN")?;
            config.api_token = Some(token);
        }

        if let Some(secs) = lookup("BAZAAR_HTTP_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("BAZAAR_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidEnvVar(
                    "BAZAAR_HTTP_TIMEOUT_SECS".to_string(),
                    "must be greater than zero".to_string(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(path) = lookup("BAZAAR_COUPON_PATH") {
            config.coupon_path = path;
        }

        config.sentry_dsn = lookup("SENTRY_DSN");

        Ok(config)
    }
}

/// Parse a base URL, normalising it to end in `/` so relative joins append.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    let url = Url::parse(&with_slash)
        .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_API_URL".to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            "BAZAAR_API_URL".to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    Ok(url)
}

/// Reject tokens that were obviously never filled in.
fn validate_token(token: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let lower = token.expose_secret().to_lowercase();

    if let Some(pattern) = PLACEHOLDER_TOKENS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    Ok(())
}
