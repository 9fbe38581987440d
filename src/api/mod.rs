use crate::error::ApiError;
use crate::models::push::{
    SubscriberInfo, SubscribeRequest, TestNotificationRequest, UnsubscribeRequest,
};
use crate::models::Notification;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const GITHUB_FAVICON_URL: &str = "https://github.githubassets.com/favicons/favicon.png";

/// Routes for subscription management and operational endpoints. The webhook
/// route lives here too so the whole API surface is assembled in one place.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/webhook", post(crate::webhook::post_webhook))
        .route("/api/subscribe", post(subscribe))
        .route("/api/unsubscribe", post(unsubscribe))
        .route("/api/subscriptions", get(list_subscriptions))
        .route("/api/vapid-public-key", get(vapid_public_key))
        .route("/api/test-notification", post(test_notification))
        .route("/api/info", get(api_info))
        .route("/health", get(health))
}

/// VAPID public key for client-side `PushManager.subscribe()`.
async fn vapid_public_key(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "publicKey": state.vapid.public_key() }))
}

/// Register (or refresh) a push subscription. Upsert semantics: the same
/// endpoint re-subscribing is the expected path, never an error.
async fn subscribe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<Value>, ApiError> {
    let sub = request.subscription;
    if !sub.endpoint.starts_with("https://") {
        return Err(ApiError::InvalidSubscription(
            "endpoint must use HTTPS".to_string(),
        ));
    }
    if sub.keys.p256dh.is_empty() || sub.keys.auth.is_empty() {
        return Err(ApiError::InvalidSubscription(
            "missing p256dh or auth key".to_string(),
        ));
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());
    state
        .store
        .upsert(&sub.endpoint, &sub.keys.p256dh, &sub.keys.auth, user_agent)
        .await?;

    info!("✅ New subscription: {}", sub.endpoint);
    Ok(Json(json!({
        "status": "success",
        "message": "Successfully subscribed",
        "endpoint": sub.endpoint,
    })))
}

/// Hard-delete a subscription by endpoint.
async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<Json<Value>, ApiError> {
    let endpoint = request.subscription.endpoint;
    if !state.store.remove(&endpoint).await? {
        return Err(ApiError::SubscriptionNotFound);
    }

    info!("✅ Unsubscribed: {}", endpoint);
    Ok(Json(json!({
        "status": "success",
        "message": "Successfully unsubscribed",
    })))
}

/// Active subscriptions, endpoint and timestamps only. Delivery credentials
/// are never re-exposed once stored.
async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let subscriptions: Vec<SubscriberInfo> = state
        .store
        .list_active()
        .await?
        .into_iter()
        .map(SubscriberInfo::from)
        .collect();

    Ok(Json(json!({
        "count": subscriptions.len(),
        "subscriptions": subscriptions,
    })))
}

/// Broadcast an operator-supplied notification to every subscriber.
async fn test_notification(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TestNotificationRequest>,
) -> Result<Json<Value>, ApiError> {
    // Bounds are in characters, not bytes; multi-byte titles count per char
    let title_len = request.title.chars().count();
    if title_len == 0 || title_len > 100 {
        return Err(ApiError::InvalidPayload(
            "title must be 1-100 characters".to_string(),
        ));
    }
    let body_len = request.body.chars().count();
    if body_len == 0 || body_len > 500 {
        return Err(ApiError::InvalidPayload(
            "body must be 1-500 characters".to_string(),
        ));
    }

    let notification = Notification {
        title: request.title,
        body: request.body,
        icon: Some(GITHUB_FAVICON_URL.to_string()),
        badge: None,
        image: None,
        url: None,
    };

    let summary = state
        .broadcaster
        .broadcast(&state.store, &notification)
        .await?;
    if summary.is_empty() {
        return Ok(Json(json!({
            "status": "warning",
            "message": "No active subscriptions",
            "count": 0,
        })));
    }

    Ok(Json(json!({
        "status": "success",
        "message": format!(
            "Test notification sent to {}/{} subscribers",
            summary.succeeded, summary.total
        ),
        "total": summary.total,
        "success": summary.succeeded,
        "failed": summary.failed,
        "results": summary.results,
    })))
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let count = state.store.count().await?;
    Ok(Json(json!({
        "status": "healthy",
        "subscriptions": count,
    })))
}

async fn api_info() -> Json<Value> {
    Json(json!({
        "name": "GitHub Star Notifier API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "info": "/api/info",
            "vapid_public_key": "/api/vapid-public-key",
            "subscribe": "/api/subscribe",
            "unsubscribe": "/api/unsubscribe",
            "test_notification": "/api/test-notification",
            "webhook": "/api/webhook",
            "subscriptions": "/api/subscriptions",
            "health": "/health",
        },
    }))
}
