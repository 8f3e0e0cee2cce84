//! Payment processor - idempotent recording of webhook transactions.
//!
//! A transaction id is recorded once. Its subscription effects are applied
//! under a reconciliation claim and the payment is then marked reconciled.
//! Redeliveries of a reconciled payment change nothing; redeliveries of a
//! payment whose earlier delivery failed before marking retry the work.
//!
//! ## Race Condition Handling
//!
//! Two deliveries of the same transaction can pass the lookup at once.
//! The insert is conditional on the external id (UNIQUE constraint); the
//! loser gets `AlreadyExists`, re-reads the winner's row and reports
//! `first_seen = false`.

use std::sync::Arc;

use super::helio_event::HelioEvent;
use super::payment::Payment;
use super::webhook_errors::WebhookError;
use chrono::Duration;

use crate::domain::foundation::{PaymentId, SubscriptionId, Timestamp};
use crate::ports::{PaymentRepository, SaveResult};

/// How long a reconciliation claim blocks other deliveries of the same
/// transaction before it is considered abandoned.
pub const RECONCILE_CLAIM_TTL_SECS: i64 = 60;

/// Result of recording a webhook transaction.
#[derive(Debug, Clone)]
pub struct RecordedPayment {
    pub payment: Payment,
    /// True only for the delivery that created the payment row.
    pub first_seen: bool,
}

/// Records payments exactly once per external transaction id.
pub struct PaymentProcessor {
    repository: Arc<dyn PaymentRepository>,
}

impl PaymentProcessor {
    pub fn new(repository: Arc<dyn PaymentRepository>) -> Self {
        Self { repository }
    }

    /// Idempotent upsert keyed by the Helio transaction id.
    ///
    /// # Errors
    ///
    /// `Persistence` on storage failure. Nothing is retried here; a 5xx
    /// response makes Helio redeliver.
    pub async fn record(&self, event: &HelioEvent) -> Result<RecordedPayment, WebhookError> {
        if let Some(existing) = self
            .repository
            .find_by_external_id(&event.transaction_id)
            .await?
        {
            return Ok(RecordedPayment {
                payment: existing,
                first_seen: false,
            });
        }

        let payment = Payment::from_event(event, Timestamp::now());

        match self.repository.insert(&payment).await? {
            SaveResult::Inserted => Ok(RecordedPayment {
                payment,
                first_seen: true,
            }),
            SaveResult::AlreadyExists => {
                tracing::debug!(
                    transaction_id = %event.transaction_id,
                    "Lost payment insert race, using existing record"
                );
                let existing = self
                    .repository
                    .find_by_external_id(&event.transaction_id)
                    .await?
                    .ok_or_else(|| {
                        WebhookError::Persistence(format!(
                            "payment {} reported as existing but not found",
                            event.transaction_id
                        ))
                    })?;
                Ok(RecordedPayment {
                    payment: existing,
                    first_seen: false,
                })
            }
        }
    }

    /// Claims the payment for reconciliation. False when it is already
    /// reconciled or another delivery is working on it.
    pub async fn claim(&self, payment_id: &PaymentId, now: Timestamp) -> Result<bool, WebhookError> {
        let stale_before = now.minus(Duration::seconds(RECONCILE_CLAIM_TTL_SECS));
        Ok(self
            .repository
            .claim_reconciliation(payment_id, now, stale_before)
            .await?)
    }

    /// Gives up a claim after a failed reconciliation. A failure here is only
    /// logged; the claim then lapses on its own.
    pub async fn release(&self, payment_id: &PaymentId) {
        if let Err(e) = self.repository.release_claim(payment_id).await {
            tracing::warn!(
                payment_id = %payment_id,
                error = %e,
                "Failed to release reconciliation claim"
            );
        }
    }

    /// Marks the payment reconciled and remembers the subscription it touched.
    pub async fn mark_reconciled(
        &self,
        payment_id: &PaymentId,
        subscription_id: Option<&SubscriptionId>,
        now: Timestamp,
    ) -> Result<(), WebhookError> {
        self.repository
            .mark_reconciled(payment_id, subscription_id, now)
            .await?;
        Ok(())
    }
}
