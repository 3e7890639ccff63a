//! Backend REST client.
//!
//! Thin wrapper over `reqwest` that resolves paths against the configured
//! base URL, attaches the session's bearer token, and turns non-2xx
//! responses into [`ApiError`]s. A 401 from any call ends the session.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::SessionStore;

/// A successful response: status plus decoded payload.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub data: T,
}

/// Shape of the backend's error payloads. Both fields are optional because
/// proxies and frameworks disagree on the key.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    error: Option<String>,
}

/// REST API client shared by every service wrapper.
///
/// Cloning is cheap; clones share the connection pool and the session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: SessionStore,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config`, seeding the session with its token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let session = config
            .api_token
            .clone()
            .map_or_else(SessionStore::new, SessionStore::with_token);
        Self::with_session(config, session)
    }

    /// Create a client that shares an existing session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be built.
    pub fn with_session(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                session,
            }),
        })
    }

    /// The session whose token is attached to requests.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Resolve `path` against the base URL. Leading slashes are ignored so
    /// the base URL's own path prefix is kept.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Url` if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    // =========================================================================
    // Verbs
    // =========================================================================

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request::<(), T>(Method::DELETE, path, None).await
    }

    /// Send a request and decode a JSON response.
    ///
    /// An empty 2xx body decodes as JSON `null`, so `T = ()` or `Option<_>`
    /// work for endpoints that return nothing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` on 401, after running the session's
    /// logout hook. The hook runs even if the 401 body cannot be read.
    /// Returns `ApiError::Status` for any other non-2xx status.
    /// Returns `ApiError::Http` on network failures or timeouts.
    /// Returns `ApiError::Decode` if a 2xx body is not the expected JSON.
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    pub async fn request<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, ApiError> {
        let url = self.endpoint(path)?;

        let mut request = self.inner.client.request(method, url);
        if let Some(token) = self.inner.session.token().await {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend returned 401, ending session");
            self.inner.session.logout().await;
            let message = match response.bytes().await {
                Ok(bytes) => error_message(&bytes),
                Err(err) => {
                    debug!(error = %err, "Could not read 401 body");
                    None
                }
            };
            return Err(ApiError::Unauthorized { message });
        }

        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(&bytes);
            debug!(status = %status, message = ?message, "Backend returned error status");
            return Err(ApiError::Status { status, message });
        }

        let data = if bytes.is_empty() {
            serde_json::from_slice(b"null")?
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(ApiResponse { status, data })
    }
}

/// The `message` (or `error`) field of an error payload, if non-blank.
fn error_message(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorPayload>(bytes)
        .ok()
        .and_then(|payload| payload.message.or(payload.error))
        .filter(|message| !message.trim().is_empty())
}
