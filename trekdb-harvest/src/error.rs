//! Error types for trekdb-harvest
//!
//! `HarvestError` covers the pipeline (network, parsing, cache I/O) and knows
//! which failures are worth retrying. `ApiError` is what HTTP handlers return;
//! it always renders as a JSON error object.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Pipeline error
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Connection-level failure (DNS, refused, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Input rejected before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// The primary source produced no data; the run cannot continue
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// The request queue dropped the operation (it panicked)
    #[error("Request queue dropped the operation")]
    QueueClosed,

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// trekdb-common error
    #[error("Common error: {0}")]
    Common(#[from] trekdb_common::Error),
}

impl HarvestError {
    /// Network failures, timeouts and 5xx responses are retried; nothing else is
    pub fn is_transient(&self) -> bool {
        match self {
            HarvestError::Network(_) | HarvestError::Timeout(_) => true,
            HarvestError::Status { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }

    /// Classify a reqwest error
    pub fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            HarvestError::Timeout(format!("{}: {}", url, err))
        } else if let Some(status) = err.status() {
            HarvestError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }
        } else if err.is_decode() {
            HarvestError::Parse(format!("{}: {}", url, err))
        } else {
            HarvestError::Network(format!("{}: {}", url, err))
        }
    }
}

/// Result type for pipeline operations
pub type HarvestResult<T> = Result<T, HarvestError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request refused (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Pipeline error surfaced through a handler
    #[error(transparent)]
    Harvest(#[from] HarvestError),

    /// trekdb-common error
    #[error("Common error: {0}")]
    Common(#[from] trekdb_common::Error),
}

/// Malformed query strings answer with the JSON error body, not axum's plain text
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected query string");
        ApiError::BadRequest("Invalid query string".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            // Details go to the log, never to the client
            ApiError::Internal(ref detail) => {
                tracing::error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
            ApiError::Harvest(ref err) => {
                tracing::error!(error = %err, "Pipeline error in handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
            ApiError::Common(ref err) => {
                tracing::error!(error = %err, "Common error in handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
