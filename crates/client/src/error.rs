//! Errors raised by the backend HTTP client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request path could not be resolved against the base URL.
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The backend rejected the session; the logout hook has been run.
    #[error("Session expired or unauthorized")]
    Unauthorized {
        /// Message from the error payload, if the body could be read.
        message: Option<String>,
    },

    /// Any other non-2xx response.
    #[error("{status}: {}", .message.as_deref().unwrap_or("request failed"))]
    Status {
        /// Response status code.
        status: StatusCode,
        /// Human-readable message from the error payload, if any.
        message: Option<String>,
    },
}

impl ApiError {
    /// Message from the backend's error payload, if it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Unauthorized { message } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether the failure happened before a response was received.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(e) if e.status().is_none())
    }
}
