//! Integration tests for Bazaar.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! Each test starts its own [`MockBackend`], an axum server on an ephemeral
//! localhost port that implements the coupon validation endpoint plus a few
//! generic routes for exercising the HTTP client.
//!
//! # Test Categories
//!
//! - `coupon_flow` - Cart store against the remote coupon validator
//! - `http_client` - Verbs, bearer auth, error payloads and the 401 hook
//! - `snapshot` - Persisting and restoring stores

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use bazaar_client::ClientConfig;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Notify;

/// Server-side rule for one coupon code.
#[derive(Debug, Clone)]
pub enum CouponRule {
    /// Percentage of the cart total, rounded to cents.
    PercentOff(Decimal),
    /// Percentage off once the cart total reaches a minimum.
    MinimumPurchase { minimum: Decimal, percent: Decimal },
    /// Always rejected as expired.
    Expired,
    /// Always rejected because its usage limit was reached.
    Exhausted,
}

/// A request received by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct BackendState {
    /// Keyed by upper-cased code.
    coupons: Mutex<HashMap<String, CouponRule>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
    token: Mutex<Option<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl BackendState {
    fn record(&self, method: Method, path: &str, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method,
                path: path.to_string(),
                authorization,
                body,
            });
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        expected.is_none_or(|token| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == format!("Bearer {token}"))
        })
    }
}

/// In-process stand-in for the Bazaar backend.
pub struct MockBackend {
    base_url: String,
    state: Arc<BackendState>,
    server: tokio::task::JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl MockBackend {
    /// Start a backend on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::unwrap_used)]
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());

        let router = Router::new()
            .route("/api/coupons/validate", post(validate_coupon))
            .route("/api/profile", get(profile))
            .route("/api/echo", any(echo))
            .route("/api/empty", post(empty))
            .route("/api/forbidden", get(forbidden))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the base URL is always a valid absolute URL.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url).unwrap()
    }

    /// Require `Authorization: Bearer <token>` on coupon and profile calls.
    pub fn require_token(&self, token: &str) {
        *self.state.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    pub fn add_coupon(&self, code: &str, rule: CouponRule) {
        self.state
            .coupons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code.to_uppercase(), rule);
    }

    /// Hold validation responses for `code` until the returned handle is
    /// notified.
    #[must_use]
    pub fn hold(&self, code: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state
            .holds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code.to_uppercase(), Arc::clone(&notify));
        notify
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until `count` requests have been received.
    pub async fn wait_for_requests(&self, count: usize) {
        while self.requests().len() < count {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateBody {
    code: String,
    #[serde(with = "rust_decimal::serde::float")]
    cart_total: Decimal,
}

async fn validate_coupon(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Method::POST, "/coupons/validate", &headers, body.clone());

    if !state.authorized(&headers) {
        return message(StatusCode::UNAUTHORIZED, "Not authorized, token failed");
    }
    let Ok(request) = serde_json::from_value::<ValidateBody>(body) else {
        return message(StatusCode::BAD_REQUEST, "Malformed request");
    };

    let code = request.code.to_uppercase();
    let hold = state
        .holds
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&code)
        .cloned();
    if let Some(hold) = hold {
        hold.notified().await;
    }

    let rule = state
        .coupons
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&code)
        .cloned();
    let percent = match rule {
        None => return message(StatusCode::NOT_FOUND, "Invalid coupon code"),
        Some(CouponRule::Expired) => return message(StatusCode::BAD_REQUEST, "Coupon expired"),
        Some(CouponRule::Exhausted) => {
            return message(StatusCode::BAD_REQUEST, "Coupon usage limit reached");
        }
        Some(CouponRule::MinimumPurchase { minimum, .. }) if request.cart_total < minimum => {
            return message(
                StatusCode::BAD_REQUEST,
                &format!("Minimum purchase of {minimum} required"),
            );
        }
        Some(CouponRule::PercentOff(percent) | CouponRule::MinimumPurchase { percent, .. }) => {
            percent
        }
    };

    let discount = (request.cart_total * percent / Decimal::ONE_HUNDRED).round_dp(2);
    Json(json!({ "code": code, "discount": discount.to_f64().unwrap_or_default() })).into_response()
}

async fn profile(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.record(Method::GET, "/profile", &headers, Value::Null);
    if !state.authorized(&headers) {
        return message(StatusCode::UNAUTHORIZED, "Not authorized, token failed");
    }
    Json(json!({ "name": "Test Customer" })).into_response()
}

async fn echo(
    State(state): State<Arc<BackendState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.record(method.clone(), "/echo", &headers, body.clone());
    Json(json!({ "method": method.as_str(), "body": body })).into_response()
}

async fn empty(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> StatusCode {
    state.record(Method::POST, "/empty", &headers, Value::Null);
    StatusCode::NO_CONTENT
}

async fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Admins only" })),
    )
        .into_response()
}
