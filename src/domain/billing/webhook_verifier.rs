//! Helio webhook authentication.
//!
//! Helio authenticates deliveries with a shared secret sent as
//! `Authorization: Bearer <token>`. The presented token is compared with the
//! configured secret in fixed time: both are hashed with SHA-256 first so the
//! comparison length never depends on the input.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::helio_event::HelioEvent;
use super::webhook_errors::WebhookError;

/// Verifier for Helio webhook bearer tokens.
pub struct HelioWebhookVerifier {
    secret: Option<SecretString>,
}

impl HelioWebhookVerifier {
    /// Creates a verifier. `None` or an empty secret leaves the webhook
    /// unconfigured, and every delivery is rejected.
    pub fn new(secret: Option<SecretString>) -> Self {
        Self {
            secret: secret.filter(|s| !s.expose_secret().is_empty()),
        }
    }

    /// Checks the `Authorization` header against the configured secret.
    ///
    /// # Errors
    ///
    /// - `MissingSecret` - No secret configured on this server
    /// - `InvalidSignature` - Header absent, not a bearer token, or wrong token
    pub fn verify(&self, authorization: Option<&str>) -> Result<(), WebhookError> {
        let secret = self.secret.as_ref().ok_or(WebhookError::MissingSecret)?;

        let token = authorization
            .and_then(bearer_token)
            .ok_or(WebhookError::InvalidSignature)?;

        if constant_time_compare(secret.expose_secret().as_bytes(), token.as_bytes()) {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    /// Boolean form of [`verify`](Self::verify). Fails closed.
    pub fn is_valid(&self, authorization: Option<&str>) -> bool {
        self.verify(authorization).is_ok()
    }

    /// Verifies the header, then decodes the untouched body.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        authorization: Option<&str>,
    ) -> Result<HelioEvent, WebhookError> {
        self.verify(authorization)?;
        HelioEvent::parse(payload)
    }
}

/// Extracts the token from `Bearer <token>`. The scheme is case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn constant_time_compare(expected: &[u8], presented: &[u8]) -> bool {
    let expected = Sha256::digest(expected);
    let presented = Sha256::digest(presented);
    expected.as_slice().ct_eq(presented.as_slice()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_helio_test";

    fn verifier() -> HelioWebhookVerifier {
        HelioWebhookVerifier::new(Some(SecretString::new(SECRET.to_string())))
    }

    fn body() -> &'static [u8] {
        br#"{"event":"CREATED","transactionObject":{"id":"tx","paylinkId":"pl","meta":{"transactionStatus":"SUCCESS"}}}"#
    }

    // ══════════════════════════════════════════════════════════════
    // Token Verification
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn accepts_matching_bearer_token() {
        assert!(verifier().verify(Some("Bearer whsec_helio_test")).is_ok());
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert!(verifier().is_valid(Some("bearer whsec_helio_test")));
        assert!(verifier().is_valid(Some("  BEARER   whsec_helio_test  ")));
    }

    #[test]
    fn rejects_token_for_different_secret() {
        let result = verifier().verify(Some("Bearer whsec_someone_else"));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn rejects_prefix_of_secret() {
        assert!(!verifier().is_valid(Some("Bearer whsec_helio")));
    }

    #[test]
    fn rejects_missing_header() {
        assert!(matches!(
            verifier().verify(None),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        assert!(!verifier().is_valid(Some("Basic whsec_helio_test")));
        assert!(!verifier().is_valid(Some("whsec_helio_test")));
        assert!(!verifier().is_valid(Some("Bearer ")));
    }

    // ══════════════════════════════════════════════════════════════
    // Unconfigured Secret
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn missing_secret_fails_closed() {
        let verifier = HelioWebhookVerifier::new(None);
        assert!(matches!(
            verifier.verify(Some("Bearer anything")),
            Err(WebhookError::MissingSecret)
        ));
        assert!(!verifier.is_valid(Some("Bearer anything")));
    }

    #[test]
    fn empty_secret_counts_as_missing() {
        let verifier = HelioWebhookVerifier::new(Some(SecretString::new(String::new())));
        assert!(matches!(
            verifier.verify(Some("Bearer ")),
            Err(WebhookError::MissingSecret)
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Verify and Parse
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_and_parse_returns_event() {
        let event = verifier()
            .verify_and_parse(body(), Some("Bearer whsec_helio_test"))
            .unwrap();
        assert_eq!(event.transaction_id, "tx");
    }

    #[test]
    fn verify_and_parse_checks_signature_before_body() {
        let result = verifier().verify_and_parse(b"garbage", Some("Bearer wrong"));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }
}
