use crate::error::ApiError;
use crate::state::AppState;
use crate::webhook::event::{self, StarEventOutcome};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// `POST /api/webhook` — the notification-dispatch pipeline.
///
/// The body is taken as raw bytes: the HMAC signature covers the exact bytes
/// GitHub sent, so parsing must happen after verification, never before.
/// Every outcome is an explicit JSON enumeration (processed / ignored /
/// no subscribers) or a typed error; nothing leaks as a bare 500.
pub async fn post_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("X-Hub-Signature-256")
        .and_then(|v| v.to_str().ok());
    state.authenticator.verify_signature(signature, &body)?;

    let star_event = event::parse_star_event(&body)?;
    state
        .authenticator
        .check_whitelist(&star_event.repository.full_name)?;

    let notification = match event::translate(&star_event) {
        StarEventOutcome::Notify(notification) => notification,
        StarEventOutcome::Ignored { action } => {
            info!("ℹ️ Ignoring webhook action: {}", action);
            return Ok(Json(json!({
                "status": "ignored",
                "message": format!("Ignoring action: {action}"),
            })));
        }
    };

    info!(
        "✅ Webhook validated: {} starred by {}",
        star_event.repository.full_name, star_event.sender.login
    );

    let summary = state.broadcaster.broadcast(&state.store, &notification).await?;
    if summary.is_empty() {
        return Ok(Json(json!({
            "status": "success",
            "message": "Webhook received, but no active subscribers",
            "subscribers": 0,
        })));
    }

    state.store.log_notification(&star_event, &body).await;

    Ok(Json(json!({
        "status": "success",
        "message": format!(
            "Notification sent to {}/{} subscribers",
            summary.succeeded, summary.total
        ),
        "subscribers": summary.total,
        "success": summary.succeeded,
        "failed": summary.failed,
    })))
}
