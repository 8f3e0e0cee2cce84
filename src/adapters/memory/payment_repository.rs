use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::billing::Payment;
use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, SubscriptionId, Timestamp};
use crate::ports::{PaymentRepository, SaveResult};

#[derive(Debug, Clone)]
struct StoredPayment {
    payment: Payment,
    claimed_at: Option<Timestamp>,
}

/// Payments keyed by Helio transaction id.
#[derive(Debug, Default)]
pub struct InMemoryPaymentRepository {
    payments: RwLock<HashMap<String, StoredPayment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.payments.read().await.len()
    }
}

fn payment_not_found(payment_id: &PaymentId) -> DomainError {
    DomainError::new(ErrorCode::PaymentNotFound, "Payment not found")
        .with_detail("payment_id", payment_id.to_string())
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .payments
            .read()
            .await
            .get(external_id)
            .map(|stored| stored.payment.clone()))
    }

    async fn insert(&self, payment: &Payment) -> Result<SaveResult, DomainError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.external_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        payments.insert(
            payment.external_id.clone(),
            StoredPayment {
                payment: payment.clone(),
                claimed_at: None,
            },
        );
        Ok(SaveResult::Inserted)
    }

    async fn claim_reconciliation(
        &self,
        payment_id: &PaymentId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut payments = self.payments.write().await;
        let stored = payments
            .values_mut()
            .find(|s| &s.payment.id == payment_id)
            .ok_or_else(|| payment_not_found(payment_id))?;

        if stored.payment.is_reconciled() {
            return Ok(false);
        }
        if matches!(stored.claimed_at, Some(claimed) if !claimed.is_before(&stale_before)) {
            return Ok(false);
        }
        stored.claimed_at = Some(now);
        Ok(true)
    }

    async fn release_claim(&self, payment_id: &PaymentId) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        if let Some(stored) = payments.values_mut().find(|s| &s.payment.id == payment_id) {
            stored.claimed_at = None;
        }
        Ok(())
    }

    async fn mark_reconciled(
        &self,
        payment_id: &PaymentId,
        subscription_id: Option<&SubscriptionId>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        let stored = payments
            .values_mut()
            .find(|s| &s.payment.id == payment_id)
            .ok_or_else(|| payment_not_found(payment_id))?;

        if let Some(subscription_id) = subscription_id {
            stored.payment.subscription_id = Some(*subscription_id);
        }
        stored.payment.reconciled_at = Some(now);
        stored.claimed_at = None;
        Ok(())
    }
}
