//! Error taxonomy for repository operations.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the task store.
///
/// The transport layer maps each kind onto an HTTP status via
/// [`IntoResponse`]; repository code only ever constructs these.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-domain input (empty title, unknown status).
    #[error("{0}")]
    Validation(String),

    /// The referenced task has no row.
    #[error("task {0} not found")]
    NotFound(i64),

    /// The underlying SQLite operation failed.
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

/// Result type for repository and handler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
