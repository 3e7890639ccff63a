//! Integration tests for the generic REST client.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bazaar_client::{ApiClient, ApiError, SessionStore};
use bazaar_integration_tests::MockBackend;
use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::{Value, json};

#[tokio::test]
async fn test_verbs_send_method_and_body() {
    let backend = MockBackend::start().await;
    let api = ApiClient::new(&backend.client_config()).unwrap();
    let body = json!({ "quantity": 3 });

    let got: Value = api.get("echo").await.unwrap().data;
    assert_eq!(got["method"], "GET");
    assert_eq!(got["body"], Value::Null);

    let posted = api.post::<_, Value>("echo", &body).await.unwrap();
    assert_eq!(posted.status, StatusCode::OK);
    assert_eq!(posted.data["method"], "POST");
    assert_eq!(posted.data["body"]["quantity"], 3);

    let put: Value = api.put("/echo", &body).await.unwrap().data;
    assert_eq!(put["method"], "PUT");

    let patched: Value = api.patch("echo", &body).await.unwrap().data;
    assert_eq!(patched["method"], "PATCH");

    let deleted: Value = api.delete("echo").await.unwrap().data;
    assert_eq!(deleted["method"], "DELETE");

    assert_eq!(backend.requests().len(), 5);
}

#[tokio::test]
async fn test_empty_body_decodes_as_unit() {
    let backend = MockBackend::start().await;
    let api = ApiClient::new(&backend.client_config()).unwrap();

    let response = api.post::<_, ()>("empty", &json!({})).await.unwrap();

    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_error_field_is_used_as_message() {
    let backend = MockBackend::start().await;
    let api = ApiClient::new(&backend.client_config()).unwrap();

    let err = api.get::<Value>("forbidden").await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status, .. } if status == StatusCode::FORBIDDEN));
    assert_eq!(err.server_message(), Some("Admins only"));
}

#[tokio::test]
async fn test_unknown_route_has_no_message() {
    let backend = MockBackend::start().await;
    let api = ApiClient::new(&backend.client_config()).unwrap();

    let err = api.get::<Value>("missing").await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status, .. } if status == StatusCode::NOT_FOUND));
    assert!(err.server_message().is_none());
}

#[tokio::test]
async fn test_anonymous_requests_carry_no_token() {
    let backend = MockBackend::start().await;
    let api = ApiClient::new(&backend.client_config()).unwrap();

    let _: Value = api.get("echo").await.unwrap().data;

    assert!(backend.requests()[0].authorization.is_none());
}

#[tokio::test]
async fn test_login_token_is_used_by_later_calls() {
    let backend = MockBackend::start().await;
    backend.require_token("abc");
    let session = SessionStore::new();
    let api = ApiClient::with_session(&backend.client_config(), session.clone()).unwrap();

    assert!(matches!(
        api.get::<Value>("profile").await,
        Err(ApiError::Unauthorized { .. })
    ));

    session.set_token(SecretString::from("abc")).await;
    let profile: Value = api.get("profile").await.unwrap().data;

    assert_eq!(profile["name"], "Test Customer");
    assert_eq!(
        backend.requests()[1].authorization.as_deref(),
        Some("Bearer abc")
    );
}

#[tokio::test]
async fn test_unauthorized_clears_token_and_runs_hook() {
    let backend = MockBackend::start().await;
    backend.require_token("fresh");
    let mut config = backend.client_config();
    config.api_token = Some(SecretString::from("stale"));
    let api = ApiClient::new(&config).unwrap();
    let logged_out = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&logged_out);
    api.session()
        .set_logout_hook(move || flag.store(true, Ordering::SeqCst))
        .await;

    let err = api.get::<Value>("profile").await.unwrap_err();

    assert_eq!(err.server_message(), Some("Not authorized, token failed"));
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert!(logged_out.load(Ordering::SeqCst));
    assert!(!api.session().is_authenticated().await);

    // The next call goes out without a token.
    let _: Value = api.get("echo").await.unwrap().data;
    assert!(backend.requests()[1].authorization.is_none());
}
