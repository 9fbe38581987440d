use crate::config::Config;
use crate::db::SubscriptionStore;
use crate::push::{Broadcaster, DeliveryClient, VapidKeys, WebPushDelivery};
use crate::webhook::WebhookAuthenticator;
use std::sync::Arc;
use tracing::info;

/// Shared application state: the composition root wired once at startup and
/// threaded through every handler. No ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: SubscriptionStore,
    pub authenticator: WebhookAuthenticator,
    pub vapid: Arc<VapidKeys>,
    pub broadcaster: Broadcaster,
}

impl AppState {
    /// Production wiring: configuration from the environment, SQLite store,
    /// real Web Push delivery client.
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env();
        let store = SubscriptionStore::connect(&config.database_url).await?;
        let delivery: Arc<dyn DeliveryClient> = Arc::new(WebPushDelivery::new()?);
        Self::assemble(config, store, delivery)
    }

    /// Assemble the state from pre-built parts. Tests use this to substitute
    /// an in-memory store and a scripted delivery client.
    pub fn assemble(
        config: Config,
        store: SubscriptionStore,
        delivery: Arc<dyn DeliveryClient>,
    ) -> anyhow::Result<Self> {
        let vapid = Arc::new(VapidKeys::init(&config)?);
        let authenticator =
            WebhookAuthenticator::new(config.webhook_secret.clone(), config.whitelist.clone());
        let broadcaster = Broadcaster::new(delivery, vapid.clone());

        info!("🚀 Application state initialized");
        Ok(Self {
            config,
            store,
            authenticator,
            vapid,
            broadcaster,
        })
    }
}
