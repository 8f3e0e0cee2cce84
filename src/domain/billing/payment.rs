//! Payment entity - one processed Helio transaction.

use rust_decimal::Decimal;

use super::helio_event::{HelioEvent, HelioEventKind, TransactionStatus};
use crate::domain::foundation::{ModelId, PaymentId, PlanId, SubscriptionId, Timestamp, UserId};

/// A recorded webhook transaction.
///
/// Keyed for idempotency by `external_id` (the Helio transaction id). The
/// user/model/plan references are optional because renewal and end events
/// may arrive without checkout metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub external_id: String,
    pub event_kind: HelioEventKind,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub currency: String,
    pub user_id: Option<UserId>,
    pub model_id: Option<ModelId>,
    pub plan_id: Option<PlanId>,
    pub paylink_id: String,
    pub blockchain_signature: Option<String>,
    /// Subscription the payment was reconciled into, once known.
    pub subscription_id: Option<SubscriptionId>,
    /// Set once the subscription effects of this transaction are applied.
    /// A payment left unset by a failed delivery is reconciled again on
    /// redelivery.
    pub reconciled_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Payment {
    /// Builds a new, not yet persisted, payment from a webhook event.
    pub fn from_event(event: &HelioEvent, now: Timestamp) -> Self {
        Self {
            id: PaymentId::new(),
            external_id: event.transaction_id.clone(),
            event_kind: event.kind.clone(),
            status: event.status.clone(),
            amount: event.amount,
            currency: event.currency.clone(),
            user_id: event.metadata.user_id(),
            model_id: event.metadata.model_id(),
            plan_id: event.metadata.plan_id(),
            paylink_id: event.paylink_id.clone(),
            blockchain_signature: event.blockchain_signature.clone(),
            subscription_id: None,
            reconciled_at: None,
            created_at: now,
        }
    }

    pub fn is_reconciled(&self) -> bool {
        self.reconciled_at.is_some()
    }
}
