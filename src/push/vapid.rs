use crate::config::Config;
use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use p256::ecdsa::SigningKey;
use p256::elliptic_curve::rand_core::OsRng;
use tracing::{info, warn};

/// VAPID keypair identifying this server to push services (RFC 8292).
///
/// The private key is the raw 32-byte P-256 scalar and the public key the
/// uncompressed SEC1 point (65 bytes, `0x04 || X || Y`), both base64url
/// without padding — the exact formats the `web-push` crate and browser
/// `applicationServerKey` expect. Immutable after startup.
pub struct VapidKeys {
    private_key_b64: String,
    public_key_b64: String,
    subject: String,
}

impl VapidKeys {
    /// Load the keypair from configuration, or generate a fresh one and
    /// announce it in the log. Generated keys are not persisted; losing them
    /// invalidates every subscription registered against them, so the
    /// operator is expected to copy them into the environment.
    pub fn init(config: &Config) -> Result<Self> {
        match (&config.vapid_private_key, &config.vapid_public_key) {
            (Some(private), Some(public)) => {
                let keys =
                    Self::from_base64url(public, private, config.vapid_subject.clone())?;
                info!("✅ Loaded VAPID keys from environment");
                Ok(keys)
            }
            _ => {
                let keys = Self::generate(config.vapid_subject.clone());
                warn!("{}", "=".repeat(60));
                warn!("⚠️ Generated new VAPID keys (save these to .env file):");
                warn!("VAPID_PRIVATE_KEY={}", keys.private_key_b64);
                warn!("VAPID_PUBLIC_KEY={}", keys.public_key_b64);
                warn!("{}", "=".repeat(60));
                Ok(keys)
            }
        }
    }

    /// Generate a fresh P-256 keypair.
    pub fn generate(subject: String) -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let public_point = signing_key.verifying_key().to_encoded_point(false);

        Self {
            private_key_b64: BASE64URL.encode(signing_key.to_bytes().as_slice()),
            public_key_b64: BASE64URL.encode(public_point.as_bytes()),
            subject,
        }
    }

    /// Reconstruct a keypair from its base64url encodings, validating that
    /// the public key is a 65-byte uncompressed point and the private key a
    /// valid 32-byte P-256 scalar.
    pub fn from_base64url(
        public_key_b64: &str,
        private_key_b64: &str,
        subject: String,
    ) -> Result<Self> {
        let pub_bytes = BASE64URL
            .decode(public_key_b64)
            .context("Invalid base64url for VAPID public key")?;
        anyhow::ensure!(
            pub_bytes.len() == 65 && pub_bytes[0] == 0x04,
            "VAPID public key must be a 65-byte uncompressed P-256 point"
        );

        let priv_bytes = BASE64URL
            .decode(private_key_b64)
            .context("Invalid base64url for VAPID private key")?;
        anyhow::ensure!(
            priv_bytes.len() == 32,
            "VAPID private key must be a 32-byte P-256 scalar, got {} bytes",
            priv_bytes.len()
        );
        SigningKey::from_bytes(priv_bytes.as_slice().into())
            .context("VAPID private key is not a valid P-256 scalar")?;

        Ok(Self {
            private_key_b64: private_key_b64.to_string(),
            public_key_b64: public_key_b64.to_string(),
            subject,
        })
    }

    /// Base64url public key, handed to browsers as the `applicationServerKey`.
    pub fn public_key(&self) -> &str {
        &self.public_key_b64
    }

    /// Base64url raw private scalar, used only for VAPID request signing.
    pub fn private_key(&self) -> &str {
        &self.private_key_b64
    }

    /// `sub` claim for VAPID JWTs, usually a `mailto:` contact.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_have_expected_encodings() {
        let keys = VapidKeys::generate("mailto:ops@example.com".to_string());

        let pub_bytes = BASE64URL.decode(keys.public_key()).unwrap();
        assert_eq!(pub_bytes.len(), 65);
        assert_eq!(pub_bytes[0], 0x04);

        let priv_bytes = BASE64URL.decode(keys.private_key()).unwrap();
        assert_eq!(priv_bytes.len(), 32);
    }

    #[test]
    fn test_roundtrip_through_base64url() {
        let keys = VapidKeys::generate("mailto:ops@example.com".to_string());
        let loaded = VapidKeys::from_base64url(
            keys.public_key(),
            keys.private_key(),
            keys.subject().to_string(),
        )
        .expect("reconstruct");

        assert_eq!(keys.public_key(), loaded.public_key());
        assert_eq!(keys.private_key(), loaded.private_key());
        assert_eq!(loaded.subject(), "mailto:ops@example.com");
    }

    #[test]
    fn test_invalid_encodings_are_rejected() {
        assert!(VapidKeys::from_base64url("not-a-key", "also-bad", String::new()).is_err());

        // valid base64 but wrong lengths
        let short = BASE64URL.encode([0u8; 10]);
        assert!(VapidKeys::from_base64url(&short, &short, String::new()).is_err());
    }
}
