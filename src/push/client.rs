use crate::models::push::Subscription;
use crate::push::vapid::VapidKeys;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use web_push::{ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessageBuilder};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);
const PUSH_TTL_SECONDS: u32 = 86400;

/// Why a single delivery attempt failed.
///
/// `Gone` means the push service declared the endpoint permanently invalid
/// (HTTP 404/410) and the subscription should be deactivated. Everything else
/// is transient: the subscriber stays active for future broadcasts.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("subscription expired or invalid (HTTP {0})")]
    Gone(u16),

    #[error("{0}")]
    Transient(String),
}

/// The Web Push delivery capability. Consumed, not implemented, by the
/// dispatch pipeline; production uses [`WebPushDelivery`], tests substitute
/// a mock.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &[u8],
        vapid: &VapidKeys,
    ) -> Result<(), DeliveryError>;
}

/// Production delivery client.
///
/// The `web-push` crate handles RFC 8291 payload encryption and VAPID
/// signing; the HTTP request itself goes out through a shared reqwest client
/// with a bounded timeout so a stalled push service cannot hang a broadcast.
pub struct WebPushDelivery {
    http: reqwest::Client,
}

impl WebPushDelivery {
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl DeliveryClient for WebPushDelivery {
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &[u8],
        vapid: &VapidKeys,
    ) -> Result<(), DeliveryError> {
        let sub_info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.p256dh,
            &subscription.auth,
        );

        let mut sig_builder = VapidSignatureBuilder::from_base64(vapid.private_key(), &sub_info)
            .map_err(|e| DeliveryError::Transient(format!("VAPID signature setup: {e}")))?;
        sig_builder.add_claim("sub", vapid.subject());
        let signature = sig_builder
            .build()
            .map_err(|e| DeliveryError::Transient(format!("VAPID signing: {e}")))?;

        let mut builder = WebPushMessageBuilder::new(&sub_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(PUSH_TTL_SECONDS);
        let message = builder
            .build()
            .map_err(|e| DeliveryError::Transient(format!("message encryption: {e}")))?;

        let mut request = self
            .http
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(push_payload) = message.payload {
            request = request.header("Content-Encoding", push_payload.content_encoding.to_str());
            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }
            request = request.body(push_payload.content);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Transient(format!("push request failed: {e}")))?;

        let status = response.status().as_u16();
        match status {
            200..=299 => Ok(()),
            404 | 410 => Err(DeliveryError::Gone(status)),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(DeliveryError::Transient(format!(
                    "push service returned HTTP {status}: {body}"
                )))
            }
        }
    }
}
