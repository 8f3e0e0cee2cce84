use std::sync::Arc;
use std::time::Duration;

use crate::application::handlers::billing::{HandleHelioWebhookHandler, SubscriptionReconciler};
use crate::application::handlers::subscription::{
    CheckAccessHandler, ExpireLapsedHandler, RenewSubscriptionHandler,
};
use crate::application::handlers::usage::{EarningsDistributor, TrackUsageHandler, UsageLedger};
use crate::domain::billing::HelioWebhookVerifier;
use crate::domain::usage::CostSchedule;
use crate::ports::{
    CatalogReader, EarningsLedger, PaymentProvider, PaymentRepository, SubscriptionRepository,
    UsageRepository,
};

/// Tunables for webhook reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct ReconcilerSettings {
    pub status_timeout: Duration,
    pub renewal_lookback_days: i64,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            status_timeout: Duration::from_secs(5),
            renewal_lookback_days: 30,
        }
    }
}

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<dyn PaymentRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub catalog: Arc<dyn CatalogReader>,
    pub usage: Arc<dyn UsageRepository>,
    pub earnings: Arc<dyn EarningsLedger>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub webhook_verifier: Arc<HelioWebhookVerifier>,
    pub cost_schedule: CostSchedule,
    pub reconciler: ReconcilerSettings,
}

impl AppState {
    /// Create handlers on demand from the shared state.
    pub fn webhook_handler(&self) -> HandleHelioWebhookHandler {
        let reconciler = SubscriptionReconciler::new(
            self.subscriptions.clone(),
            self.catalog.clone(),
            self.payment_provider.clone(),
        )
        .with_status_timeout(self.reconciler.status_timeout)
        .with_renewal_lookback_days(self.reconciler.renewal_lookback_days);

        HandleHelioWebhookHandler::new(
            self.webhook_verifier.clone(),
            self.payments.clone(),
            reconciler,
        )
    }

    pub fn renew_handler(&self) -> RenewSubscriptionHandler {
        RenewSubscriptionHandler::new(
            self.subscriptions.clone(),
            self.catalog.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn usage_ledger(&self) -> Arc<UsageLedger> {
        Arc::new(UsageLedger::new(
            self.usage.clone(),
            self.subscriptions.clone(),
            self.catalog.clone(),
            self.cost_schedule,
        ))
    }

    pub fn track_usage_handler(&self) -> TrackUsageHandler {
        TrackUsageHandler::new(
            self.catalog.clone(),
            self.subscriptions.clone(),
            self.usage_ledger(),
            Arc::new(EarningsDistributor::new(
                self.catalog.clone(),
                self.earnings.clone(),
            )),
        )
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.subscriptions.clone(), self.usage_ledger())
    }

    pub fn expire_lapsed_handler(&self) -> ExpireLapsedHandler {
        ExpireLapsedHandler::new(self.subscriptions.clone())
    }
}
