use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors surfaced by the HTTP handlers.
///
/// Admission errors (signature, whitelist) map to 403, validation errors to
/// 400, lookups to 404 and everything unexpected to 500. Per-subscriber
/// delivery failures are never represented here; they are carried in the
/// broadcast summary instead.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("X-Hub-Signature-256 header is missing or malformed")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Repository '{0}' is not in whitelist")]
    RepositoryNotWhitelisted(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid subscription data: {0}")]
    InvalidSubscription(String),

    #[error("Subscription not found")]
    SubscriptionNotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

// ============================================================================
// HTTP RESPONSE CONVERSION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingSignature
            | ApiError::InvalidSignature
            | ApiError::RepositoryNotWhitelisted(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidPayload(_) | ApiError::InvalidSubscription(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::SubscriptionNotFound => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("❌ Internal error: {}", self);
        }

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
