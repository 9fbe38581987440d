use crate::error::ApiError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashSet;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Admission control for inbound webhooks: HMAC signature verification and
/// repository whitelisting. The two gates are independent; both must pass
/// before an event is translated.
#[derive(Clone)]
pub struct WebhookAuthenticator {
    secret: Option<String>,
    whitelist: HashSet<String>,
}

impl WebhookAuthenticator {
    pub fn new(secret: Option<String>, whitelist: HashSet<String>) -> Self {
        Self { secret, whitelist }
    }

    /// Verify the `X-Hub-Signature-256` header against the raw request body.
    ///
    /// Must run on the exact bytes GitHub sent; re-serialized JSON is not
    /// guaranteed to be byte-identical. With no secret configured the check
    /// is skipped entirely (explicit opt-out).
    pub fn verify_signature(
        &self,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), ApiError> {
        let Some(secret) = self.secret.as_deref() else {
            warn!("⚠️ WEBHOOK_SECRET not configured, skipping signature verification");
            return Ok(());
        };

        let signature = signature.ok_or(ApiError::MissingSignature)?;
        let received_hex = signature
            .strip_prefix("sha256=")
            .ok_or(ApiError::MissingSignature)?;
        let received = hex::decode(received_hex).map_err(|_| ApiError::InvalidSignature)?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| ApiError::InvalidSignature)?;
        mac.update(body);

        // verify_slice is a constant-time comparison
        mac.verify_slice(&received)
            .map_err(|_| ApiError::InvalidSignature)
    }

    /// Check the repository against the configured whitelist. An empty
    /// whitelist admits everything (explicit opt-out).
    pub fn check_whitelist(&self, repo_full_name: &str) -> Result<(), ApiError> {
        if self.whitelist.is_empty() {
            warn!("⚠️ WEBHOOK_WHITELIST is empty, allowing all repositories");
            return Ok(());
        }

        if self.whitelist.contains(repo_full_name) {
            Ok(())
        } else {
            Err(ApiError::RepositoryNotWhitelisted(
                repo_full_name.to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn authenticator(secret: Option<&str>, whitelist: &[&str]) -> WebhookAuthenticator {
        WebhookAuthenticator::new(
            secret.map(String::from),
            whitelist.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_valid_signature_verifies() {
        let auth = authenticator(Some("s3cret"), &[]);
        let body = br#"{"action":"started"}"#;
        let sig = sign("s3cret", body);
        assert!(auth.verify_signature(Some(&sig), body).is_ok());
    }

    #[test]
    fn test_flipping_one_body_byte_invalidates_signature() {
        let auth = authenticator(Some("s3cret"), &[]);
        let body = br#"{"action":"started"}"#.to_vec();
        let sig = sign("s3cret", &body);

        let mut tampered = body.clone();
        tampered[3] ^= 0x01;
        assert!(matches!(
            auth.verify_signature(Some(&sig), &tampered),
            Err(ApiError::InvalidSignature)
        ));
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let auth = authenticator(Some("s3cret"), &[]);
        assert!(matches!(
            auth.verify_signature(None, b"{}"),
            Err(ApiError::MissingSignature)
        ));
    }

    #[test]
    fn test_malformed_prefix_is_rejected() {
        let auth = authenticator(Some("s3cret"), &[]);
        assert!(matches!(
            auth.verify_signature(Some("sha1=deadbeef"), b"{}"),
            Err(ApiError::MissingSignature)
        ));
    }

    #[test]
    fn test_undecodable_hex_is_rejected() {
        let auth = authenticator(Some("s3cret"), &[]);
        assert!(matches!(
            auth.verify_signature(Some("sha256=not-hex"), b"{}"),
            Err(ApiError::InvalidSignature)
        ));
    }

    #[test]
    fn test_no_secret_admits_unconditionally() {
        let auth = authenticator(None, &[]);
        assert!(auth.verify_signature(None, b"{}").is_ok());
        assert!(auth.verify_signature(Some("sha256=bogus"), b"{}").is_ok());
    }

    #[test]
    fn test_empty_whitelist_admits_any_repository() {
        let auth = authenticator(None, &[]);
        assert!(auth.check_whitelist("anyone/anything").is_ok());
    }

    #[test]
    fn test_whitelist_admits_only_listed_names() {
        let auth = authenticator(None, &["acme/widget"]);
        assert!(auth.check_whitelist("acme/widget").is_ok());
        assert!(matches!(
            auth.check_whitelist("acme/Widget"),
            Err(ApiError::RepositoryNotWhitelisted(_))
        ));
    }
}
