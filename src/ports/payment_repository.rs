//! PaymentRepository port - the payment ledger.
//!
//! Helio redelivers a webhook whenever it does not receive a 2xx, so the
//! same transaction can arrive many times. The external transaction id is a
//! unique key; `insert` must be a conditional insert that reports, rather
//! than fails on, an existing row.
//!
//! Recording and reconciling are separate steps. A delivery claims the
//! payment before touching subscriptions and marks it reconciled after, so a
//! redelivery can finish work an earlier failed delivery left undone while a
//! concurrent delivery of the same transaction is kept out.

use async_trait::async_trait;

use crate::domain::billing::Payment;
use crate::domain::foundation::{DomainError, PaymentId, SubscriptionId, Timestamp};

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Row was written by this call.
    Inserted,
    /// A row with the same key already existed; nothing was written.
    AlreadyExists,
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Looks up a payment by Helio transaction id.
    async fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<Payment>, DomainError>;

    /// Inserts unless a payment with the same external id exists.
    async fn insert(&self, payment: &Payment) -> Result<SaveResult, DomainError>;

    /// Takes the reconciliation claim on an unreconciled payment.
    ///
    /// Succeeds when no claim exists or the existing one was taken before
    /// `stale_before`. Returns false if the payment is already reconciled or
    /// another delivery holds a live claim.
    async fn claim_reconciliation(
        &self,
        payment_id: &PaymentId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Drops a claim after a failed reconciliation so the next delivery can
    /// retry immediately.
    async fn release_claim(&self, payment_id: &PaymentId) -> Result<(), DomainError>;

    /// Marks the payment reconciled, recording the subscription it touched.
    async fn mark_reconciled(
        &self,
        payment_id: &PaymentId,
        subscription_id: Option<&SubscriptionId>,
        now: Timestamp,
    ) -> Result<(), DomainError>;
}
