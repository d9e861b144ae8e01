//! Error types for the chat web service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chat_core::ValidationError;
use thiserror::Error;

/// Errors that can occur in request handlers.
#[derive(Debug, Error)]
pub enum WebError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// Request failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Required fields missing or malformed.
    #[error("{0}")]
    BadRequest(String),

    /// Caller is not allowed in.
    #[error("{0}")]
    Unauthorized(String),

    /// Route exists but is switched off.
    #[error("{0}")]
    Forbidden(String),

    /// Referenced record does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            WebError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            WebError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            WebError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, WebError>;
