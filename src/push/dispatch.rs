use crate::db::SubscriptionStore;
use crate::error::ApiError;
use crate::models::push::Notification;
use crate::push::client::{DeliveryClient, DeliveryError};
use crate::push::vapid::VapidKeys;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound on in-flight deliveries within one broadcast. Subscriber count
/// is unbounded and each delivery is an independent network call.
const MAX_CONCURRENT_DELIVERIES: usize = 8;

/// Hard cap per delivery; one unresponsive endpoint must not stall the rest.
const BROADCAST_DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Per-subscriber outcome of one broadcast.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    /// Push service reported the endpoint permanently gone; the subscription
    /// has been marked inactive.
    Expired,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    pub endpoint: String,
    #[serde(flatten)]
    pub outcome: DeliveryOutcome,
}

/// Aggregate result of fanning one notification out to all subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<DeliveryResult>,
}

impl BroadcastSummary {
    fn empty() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            results: Vec::new(),
        }
    }

    /// True when there were no active subscribers to deliver to.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Fans notifications out to every active subscriber.
///
/// Failure isolation is the central invariant: each delivery runs
/// independently, and one subscriber's failure never aborts the others.
/// Permanent failures (endpoint gone) deactivate the subscription; transient
/// ones leave it untouched for the next broadcast.
#[derive(Clone)]
pub struct Broadcaster {
    client: Arc<dyn DeliveryClient>,
    vapid: Arc<VapidKeys>,
    delivery_timeout: Duration,
}

impl Broadcaster {
    pub fn new(client: Arc<dyn DeliveryClient>, vapid: Arc<VapidKeys>) -> Self {
        Self {
            client,
            vapid,
            delivery_timeout: BROADCAST_DELIVERY_TIMEOUT,
        }
    }

    /// Override the per-delivery timeout. Tests use this to hit the timeout
    /// path without waiting out the production cap.
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Deliver `notification` to a snapshot of the active subscribers and
    /// report the aggregate outcome. Zero active subscribers short-circuits
    /// without touching the delivery capability.
    pub async fn broadcast(
        &self,
        store: &SubscriptionStore,
        notification: &Notification,
    ) -> Result<BroadcastSummary, ApiError> {
        let subscriptions = store.list_active().await?;
        if subscriptions.is_empty() {
            info!("⚠️ No active subscriptions to notify");
            return Ok(BroadcastSummary::empty());
        }

        let payload =
            serde_json::to_vec(notification).map_err(|e| ApiError::Internal(e.into()))?;

        info!("📢 Broadcasting to {} subscriptions...", subscriptions.len());

        let client = self.client.as_ref();
        let vapid = self.vapid.as_ref();
        let payload = payload.as_slice();
        let delivery_timeout = self.delivery_timeout;

        let results: Vec<DeliveryResult> = stream::iter(subscriptions)
            .map(|sub| async move {
                let attempt = tokio::time::timeout(
                    delivery_timeout,
                    client.deliver(&sub, payload, vapid),
                );
                let outcome = match attempt.await {
                    Ok(Ok(())) => DeliveryOutcome::Delivered,
                    Ok(Err(DeliveryError::Gone(status))) => {
                        warn!(
                            "⚠️ Subscription expired (HTTP {}): {}",
                            status, sub.endpoint
                        );
                        DeliveryOutcome::Expired
                    }
                    Ok(Err(DeliveryError::Transient(error))) => {
                        warn!("❌ Failed to send to {}: {}", sub.endpoint, error);
                        DeliveryOutcome::Failed { error }
                    }
                    Err(_) => DeliveryOutcome::Failed {
                        error: "delivery timed out".to_string(),
                    },
                };
                DeliveryResult {
                    endpoint: sub.endpoint,
                    outcome,
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DELIVERIES)
            .collect()
            .await;

        // Prune permanently-dead endpoints; transient failures stay active.
        for result in &results {
            if matches!(result.outcome, DeliveryOutcome::Expired) {
                if let Err(e) = store.mark_inactive(&result.endpoint).await {
                    warn!("⚠️ Failed to mark {} inactive: {}", result.endpoint, e);
                }
            }
        }

        let succeeded = results
            .iter()
            .filter(|r| matches!(r.outcome, DeliveryOutcome::Delivered))
            .count();
        let summary = BroadcastSummary {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        };

        info!(
            "📊 Broadcast complete: {} success, {} failed",
            summary.succeeded, summary.failed
        );
        Ok(summary)
    }
}
