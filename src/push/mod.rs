pub mod client;
pub mod dispatch;
pub mod vapid;

pub use client::{DeliveryClient, DeliveryError, WebPushDelivery};
pub use dispatch::{BroadcastSummary, Broadcaster, DeliveryOutcome, DeliveryResult};
pub use vapid::VapidKeys;
