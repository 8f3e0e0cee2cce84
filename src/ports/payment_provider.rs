//! Payment provider port - outbound calls to Helio.
//!
//! Two operations are needed: creating a pay-link for a renewal checkout and
//! asking for the settled status of a transaction whose webhook arrived as
//! pending. Status lookups sit on the webhook path and must be bounded by a
//! timeout; callers degrade a failure to `Unknown`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::{ModelId, PlanId, SubscriptionId, UserId};
use crate::domain::subscription::RenewalDuration;

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a hosted checkout for the given price.
    async fn create_pay_link(&self, request: PayLinkRequest) -> Result<PayLink, PaymentProviderError>;

    /// Fetches the settled status of a transaction.
    async fn transaction_status(
        &self,
        transaction_id: &str,
    ) -> Result<ProviderTransactionStatus, PaymentProviderError>;
}

/// Checkout to create.
#[derive(Debug, Clone, PartialEq)]
pub struct PayLinkRequest {
    pub name: String,
    pub price: Decimal,
    pub currency: String,
    pub user_id: UserId,
    pub model_id: ModelId,
    pub plan_id: PlanId,
    pub duration: RenewalDuration,
    /// Subscription being renewed, echoed back in webhook metadata.
    pub subscription_id: Option<SubscriptionId>,
}

impl PayLinkRequest {
    /// Merchant metadata Helio will echo on the resulting webhooks.
    pub fn metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("userId".to_string(), self.user_id.to_string());
        metadata.insert("modelId".to_string(), self.model_id.to_string());
        metadata.insert("planId".to_string(), self.plan_id.to_string());
        metadata.insert("duration".to_string(), self.duration.to_string());
        if let Some(id) = &self.subscription_id {
            metadata.insert("subscriptionId".to_string(), id.to_string());
        }
        metadata
    }
}

/// A created checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayLink {
    pub id: String,
    pub url: String,
}

/// Settled status as reported by the provider API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderTransactionStatus {
    Success,
    Pending,
    Failed,
    /// The provider could not be asked, or gave an unrecognised answer.
    Unknown,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentProviderError {
    #[error("payment provider request timed out")]
    Timeout,

    #[error("payment provider network error: {0}")]
    Network(String),

    #[error("payment provider rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected payment provider response: {0}")]
    InvalidResponse(String),
}

impl PaymentProviderError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentProviderError::Timeout | PaymentProviderError::Network(_) => true,
            PaymentProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            PaymentProviderError::InvalidResponse(_) => false,
        }
    }
}
