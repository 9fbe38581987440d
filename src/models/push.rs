use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored push subscription row.
///
/// Credentials (`p256dh`, `auth`) are opaque base64url strings supplied by the
/// browser. They are never serialized back out through the API; listing
/// endpoints use [`SubscriberInfo`] instead.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_active: bool,
}

/// Sanitized view of a subscription for the listing endpoint.
#[derive(Debug, Serialize)]
pub struct SubscriberInfo {
    pub endpoint: String,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl From<Subscription> for SubscriberInfo {
    fn from(sub: Subscription) -> Self {
        Self {
            endpoint: sub.endpoint,
            created_at: sub.created_at,
            last_seen: sub.last_seen,
        }
    }
}

/// Payload pushed to every subscriber. Ephemeral: built per webhook event,
/// serialized once and discarded.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
}

// ============================================================================
// API REQUEST SHAPES
// ============================================================================

/// `POST /api/subscribe` body: the standard PushSubscription JSON produced by
/// `PushManager.subscribe()` in the browser.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub subscription: SubscriptionPayload,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionPayload {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// `POST /api/unsubscribe` body. Same outer shape as subscribe, but only the
/// endpoint matters; any extra fields the browser sends are ignored.
#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub subscription: EndpointRef,
}

#[derive(Debug, Deserialize)]
pub struct EndpointRef {
    pub endpoint: String,
}

/// `POST /api/test-notification` body.
#[derive(Debug, Deserialize)]
pub struct TestNotificationRequest {
    pub title: String,
    pub body: String,
}
