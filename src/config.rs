use std::collections::HashSet;
use std::env;
use tracing::warn;

/// Runtime configuration, read once at startup from the environment.
///
/// All webhook and VAPID settings are optional: missing values degrade to the
/// documented opt-out behavior (no signature check, allow-all whitelist,
/// freshly generated keys) rather than failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub static_dir: String,
    /// Shared secret for GitHub webhook HMAC signatures. `None` disables
    /// signature verification.
    pub webhook_secret: Option<String>,
    /// Set of `owner/repo` names admitted by the webhook. Empty = allow all.
    pub whitelist: HashSet<String>,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    /// `sub` claim sent to push services, usually a `mailto:` contact.
    pub vapid_subject: String,
}

impl Config {
    pub fn from_env() -> Self {
        let whitelist = parse_whitelist(
            &env::var("WEBHOOK_WHITELIST").unwrap_or_else(|_| "[]".to_string()),
        );

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:star_notifier.db".to_string()),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            whitelist,
            vapid_private_key: env::var("VAPID_PRIVATE_KEY").ok().filter(|s| !s.is_empty()),
            vapid_public_key: env::var("VAPID_PUBLIC_KEY").ok().filter(|s| !s.is_empty()),
            vapid_subject: env::var("VAPID_SUBJECT")
                .unwrap_or_else(|_| "mailto:example@example.com".to_string()),
        }
    }
}

/// Parse the repository whitelist from its env representation, a JSON array
/// of `owner/repo` strings. An unparsable value logs a warning and falls back
/// to the empty (allow-all) set.
fn parse_whitelist(raw: &str) -> HashSet<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(entries) => entries.into_iter().collect(),
        Err(_) => {
            warn!("⚠️ Invalid WEBHOOK_WHITELIST format: {raw}");
            HashSet::new()
        }
    }
}
