//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Write paths (webhooks, renewals, usage tracking) are command handlers;
//! access checks are queries.

pub mod handlers;

pub use handlers::{
    // Billing
    HandleHelioWebhookCommand, HandleHelioWebhookHandler, HandleHelioWebhookResult,
    ReconcileOutcome, SubscriptionReconciler,
    // Subscriptions
    CheckAccessHandler, CheckAccessQuery, CheckAccessResult,
    ExpireLapsedHandler, ExpireLapsedResult,
    RenewSubscriptionCommand, RenewSubscriptionHandler, RenewSubscriptionResult,
    // Usage
    EarningsDistributor, TrackUsageCommand, TrackUsageHandler, TrackUsageResult, UsageLedger,
};
