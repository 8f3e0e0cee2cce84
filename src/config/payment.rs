//! Payment configuration (Helio)

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Helio credentials and endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Helio API key, used for pay-links and status lookups
    pub helio_api_key: Option<SecretString>,

    /// Shared secret Helio sends as `Authorization: Bearer <secret>`
    pub helio_webhook_secret: Option<SecretString>,

    #[serde(default = "default_api_base_url")]
    pub helio_api_base_url: String,

    /// Host serving hosted checkout pages
    #[serde(default = "default_checkout_base_url")]
    pub helio_checkout_base_url: String,

    /// Per-request timeout for Helio API calls, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Bound on the status lookup made while handling a webhook, in seconds
    #[serde(default = "default_status_timeout")]
    pub status_timeout_secs: u64,
}

impl PaymentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }

    /// Validate payment configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.request_timeout_secs == 0 || self.status_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if production {
            if self.helio_api_key.is_none() {
                return Err(ValidationError::MissingRequired("PAYMENT__HELIO_API_KEY"));
            }
            if self.helio_webhook_secret.is_none() {
                return Err(ValidationError::WebhookSecretRequired);
            }
            if !self.helio_api_base_url.starts_with("https://") {
                return Err(ValidationError::ProviderUrlMustBeHttps);
            }
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            helio_api_key: None,
            helio_webhook_secret: None,
            helio_api_base_url: default_api_base_url(),
            helio_checkout_base_url: default_checkout_base_url(),
            request_timeout_secs: default_request_timeout(),
            status_timeout_secs: default_status_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.hel.io".to_string()
}

fn default_checkout_base_url() -> String {
    "https://app.hel.io".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_status_timeout() -> u64 {
    5
}
