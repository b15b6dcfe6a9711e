//! Error taxonomy surfaced to administrators.
//!
//! | Variant | HTTP | Meaning |
//! |---------|------|---------|
//! | `Validation` | 400 | bad form input, nothing written |
//! | `NotFound` | 404 | unknown group or product |
//! | `Store` | 500 | anything else from the storage layer |
//!
//! Per-item write failures during apply are not errors at this level; they
//! are collected in [`crate::apply::ApplyReport`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type BulkResult<T> = std::result::Result<T, BulkError>;

impl BulkError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BulkError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        BulkError::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BulkError::Validation(_) => StatusCode::BAD_REQUEST,
            BulkError::NotFound(_) => StatusCode::NOT_FOUND,
            BulkError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for BulkError {
    fn from(e: sqlx::Error) -> Self {
        BulkError::Store(e.into())
    }
}

impl IntoResponse for BulkError {
    fn into_response(self) -> Response {
        if let BulkError::Store(ref e) = self {
            tracing::error!(error = %e, "storage failure");
        }
        (
            self.status(),
            Json(serde_json::json!({"error": self.to_string()})),
        )
            .into_response()
    }
}
