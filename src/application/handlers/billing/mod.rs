//! Billing handlers - Helio webhook intake and subscription reconciliation.

mod handle_helio_webhook;
mod reconcile_subscription;

pub use handle_helio_webhook::{
    HandleHelioWebhookCommand, HandleHelioWebhookHandler, HandleHelioWebhookResult,
};
pub use reconcile_subscription::{ReconcileOutcome, SubscriptionReconciler};
