//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod billing;
pub mod subscription;
pub mod usage;

#[cfg(test)]
pub(crate) mod test_support;

pub use billing::{
    HandleHelioWebhookCommand, HandleHelioWebhookHandler, HandleHelioWebhookResult,
    ReconcileOutcome, SubscriptionReconciler,
};
pub use subscription::{
    CheckAccessHandler, CheckAccessQuery, CheckAccessResult, ExpireLapsedHandler,
    ExpireLapsedResult, RenewSubscriptionCommand, RenewSubscriptionHandler,
    RenewSubscriptionResult,
};
pub use usage::{
    EarningsDistributor, TrackUsageCommand, TrackUsageHandler, TrackUsageResult, UsageLedger,
};
