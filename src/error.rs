//! Error types for the offline cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Offline Error Enum ==
/// Unified error type for the offline cache controller and its front.
#[derive(Error, Debug)]
pub enum OfflineError {
    /// Network fetch rejected (unreachable origin, reset connection, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// A precache manifest resource could not be fetched during install
    #[error("Precache failed for {url}: {reason}")]
    PrecacheFailed { url: String, reason: String },

    /// Navigation failed offline and no shell document is cached
    #[error("Shell unavailable offline: {0}")]
    ShellUnavailable(String),

    /// Cache write refused by the storage quota
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Named cache does not exist
    #[error("Cache not found: {0}")]
    CacheNotFound(String),

    /// Lifecycle entry point called out of order
    #[error("Invalid lifecycle state: {0}")]
    InvalidState(String),

    /// Malformed request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for OfflineError {
    fn from(err: reqwest::Error) -> Self {
        OfflineError::Network(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for OfflineError {
    fn into_response(self) -> Response {
        let status = match &self {
            OfflineError::Network(_) => StatusCode::BAD_GATEWAY,
            OfflineError::PrecacheFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            OfflineError::ShellUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            OfflineError::QuotaExceeded(_) => StatusCode::INSUFFICIENT_STORAGE,
            OfflineError::CacheNotFound(_) => StatusCode::NOT_FOUND,
            OfflineError::InvalidState(_) => StatusCode::CONFLICT,
            OfflineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            OfflineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the offline cache.
pub type Result<T> = std::result::Result<T, OfflineError>;
