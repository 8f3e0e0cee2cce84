//! HandleHelioWebhookHandler - Command handler for Helio payment webhooks.
//!
//! Verifies the Bearer token, parses the body, records the payment once per
//! transaction id and reconciles subscriptions until the payment is marked
//! reconciled. A delivery that fails part way leaves the payment unreconciled
//! and Helio's redelivery finishes the job.

use std::sync::Arc;

use crate::domain::billing::{HelioWebhookVerifier, PaymentProcessor, WebhookError};
use crate::domain::foundation::{PaymentId, SubscriptionId, Timestamp};
use crate::ports::{CatalogReader, PaymentProvider, PaymentRepository, SubscriptionRepository};

use super::reconcile_subscription::{ReconcileOutcome, SubscriptionReconciler};

/// Command carrying an untouched webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleHelioWebhookCommand {
    /// Raw request body.
    pub payload: Vec<u8>,
    /// `Authorization` header value, if present.
    pub authorization: Option<String>,
}

/// Result of webhook processing.
#[derive(Debug, Clone)]
pub struct HandleHelioWebhookResult {
    pub payment_id: PaymentId,
    pub subscription_id: Option<SubscriptionId>,
    /// True when the transaction had already been reconciled and nothing
    /// was applied by this delivery.
    pub duplicate: bool,
}

/// Handler for Helio webhook deliveries.
pub struct HandleHelioWebhookHandler {
    verifier: Arc<HelioWebhookVerifier>,
    processor: PaymentProcessor,
    reconciler: SubscriptionReconciler,
}

impl HandleHelioWebhookHandler {
    pub fn new(
        verifier: Arc<HelioWebhookVerifier>,
        payments: Arc<dyn PaymentRepository>,
        reconciler: SubscriptionReconciler,
    ) -> Self {
        Self {
            verifier,
            processor: PaymentProcessor::new(payments),
            reconciler,
        }
    }

    /// Wires a handler with the default reconciler settings.
    pub fn with_ports(
        verifier: Arc<HelioWebhookVerifier>,
        payments: Arc<dyn PaymentRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        catalog: Arc<dyn CatalogReader>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self::new(
            verifier,
            payments,
            SubscriptionReconciler::new(subscriptions, catalog, payment_provider),
        )
    }

    pub async fn handle(
        &self,
        cmd: HandleHelioWebhookCommand,
    ) -> Result<HandleHelioWebhookResult, WebhookError> {
        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, cmd.authorization.as_deref())?;

        let recorded = self.processor.record(&event).await?;
        let payment_id = recorded.payment.id;

        if recorded.payment.is_reconciled() {
            tracing::info!(
                transaction_id = %event.transaction_id,
                payment_id = %payment_id,
                "Duplicate Helio delivery, skipping reconciliation"
            );
            return Ok(HandleHelioWebhookResult {
                payment_id,
                subscription_id: recorded.payment.subscription_id,
                duplicate: true,
            });
        }

        if !self.processor.claim(&payment_id, Timestamp::now()).await? {
            tracing::info!(
                transaction_id = %event.transaction_id,
                payment_id = %payment_id,
                "Another delivery is reconciling this payment"
            );
            return Err(WebhookError::ReconciliationInProgress);
        }

        if recorded.first_seen {
            tracing::info!(
                transaction_id = %event.transaction_id,
                event = %event.kind.as_str(),
                status = %event.status.as_str(),
                payment_id = %payment_id,
                "Helio payment recorded"
            );
        } else {
            tracing::warn!(
                transaction_id = %event.transaction_id,
                payment_id = %payment_id,
                "Retrying reconciliation of unreconciled payment"
            );
        }

        let outcome = match self.reconciler.reconcile(&event).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.processor.release(&payment_id).await;
                return Err(e);
            }
        };
        let subscription_id = outcome.subscription_id();

        self.processor
            .mark_reconciled(&payment_id, subscription_id.as_ref(), Timestamp::now())
            .await?;
        if let ReconcileOutcome::Unchanged { reason } = &outcome {
            tracing::debug!(payment_id = %payment_id, reason = %reason, "No subscription change");
        }

        Ok(HandleHelioWebhookResult {
            payment_id,
            subscription_id,
            duplicate: false,
        })
    }
}
