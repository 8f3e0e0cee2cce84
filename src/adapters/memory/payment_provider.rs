use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::PaymentId;
use crate::ports::{
    PayLink, PayLinkRequest, PaymentProvider, PaymentProviderError, ProviderTransactionStatus,
};

/// Offline stand-in for the Helio API.
///
/// Pay links point at `base_url` and every request is kept for inspection.
/// Transaction statuses default to `Unknown` until set.
#[derive(Debug)]
pub struct InMemoryPaymentProvider {
    base_url: String,
    requests: Mutex<Vec<PayLinkRequest>>,
    statuses: RwLock<HashMap<String, ProviderTransactionStatus>>,
}

impl InMemoryPaymentProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            requests: Mutex::new(Vec::new()),
            statuses: RwLock::new(HashMap::new()),
        }
    }

    pub async fn set_status(&self, transaction_id: &str, status: ProviderTransactionStatus) {
        self.statuses
            .write()
            .await
            .insert(transaction_id.to_string(), status);
    }

    pub async fn requests(&self) -> Vec<PayLinkRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PaymentProvider for InMemoryPaymentProvider {
    async fn create_pay_link(
        &self,
        request: PayLinkRequest,
    ) -> Result<PayLink, PaymentProviderError> {
        let id = PaymentId::new().to_string();
        let url = format!("{}/pay/{}", self.base_url.trim_end_matches('/'), id);
        self.requests.lock().await.push(request);
        Ok(PayLink { id, url })
    }

    async fn transaction_status(
        &self,
        transaction_id: &str,
    ) -> Result<ProviderTransactionStatus, PaymentProviderError> {
        Ok(self
            .statuses
            .read()
            .await
            .get(transaction_id)
            .copied()
            .unwrap_or(ProviderTransactionStatus::Unknown))
    }
}
