//! Error types for notegate-capture

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// notegate-common error
    #[error("Common error: {0}")]
    Common(#[from] notegate_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
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

/// Failures inside the ingest pipeline.
///
/// The dispatcher recovers every variant except storage failures into a
/// user-visible reply plus an ack; storage failures propagate so the
/// transport can redeliver (deduplication makes redelivery safe).
#[derive(Debug, Error)]
pub enum IngestError {
    /// Outbound delivery through the chat gateway failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Oracle failure where a later retry may succeed (timeout, connect, 5xx)
    #[error("Classification failed (transient): {0}")]
    ClassificationTransient(String),

    /// Oracle failure no retry can help (malformed shape, unknown category, 4xx)
    #[error("Classification failed (permanent): {0}")]
    ClassificationPermanent(String),

    /// The source message already has an audit entry
    #[error("Duplicate message: {0}")]
    DuplicateMessage(String),

    /// A fix reply could not be traced to any audit entry
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Fix target equals the current category; nothing to do
    #[error("Already filed as {0}")]
    AlreadyInTargetCategory(String),

    /// Storage failure from a statement issued directly by the pipeline
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// notegate-common error (includes db-layer failures)
    #[error(transparent)]
    Common(#[from] notegate_common::Error),
}

impl IngestError {
    /// Whether the dispatcher may answer this with a chat reply instead of
    /// failing the webhook call.
    pub fn is_user_recoverable(&self) -> bool {
        !matches!(self, IngestError::Database(_) | IngestError::Common(_))
    }
}
