//! # error
//!
//! Centralised application error type.
//!
//! Every handler returns `Result<_, AppError>`.  Axum's `IntoResponse` impl
//! converts these into structured JSON error bodies so the host UI always gets
//! a machine-readable response even on failure.
//!
//! None of these are process-fatal.  Storage failures never show up here:
//! stores log them as [`StoreError`] and report [`Durability::MemoryOnly`]
//! while the core keeps running in memory.
//!
//! [`StoreError`]: crate::store::StoreError
//! [`Durability::MemoryOnly`]: crate::store::Durability::MemoryOnly

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed expense data (negative or out-of-range amount, blank name, no splits).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Notification permission is not granted (or notifications are switched off).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The AI bill parser failed; propagated unchanged, never retried here.
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Reminder status change that would leave a terminal state.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// The request payload was syntactically correct but semantically invalid.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::ExtractionFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(json!({
            "ok":    false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
