//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for groups, peers and the HTTP surfaces.
///
/// Errors are `Clone` because a single load result is handed to every caller
/// that was waiting on the same key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Caller asked for the empty key
    #[error("key is empty")]
    EmptyKey,

    /// The source callback could not produce a value for the key
    #[error("key not found: {0}")]
    NotFound(String),

    /// A remote peer failed to answer; absorbed by the load path
    #[error("peer unavailable: {0}")]
    PeerUnavailable(String),

    /// Invalid request data
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::EmptyKey | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            CacheError::PeerUnavailable(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
