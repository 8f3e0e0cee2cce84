//! TrackUsageHandler - Command handler for metering a model operation.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::application::handlers::subscription::find_entitled;
use crate::domain::foundation::{ModelId, Timestamp, UsageRecordId, UserId};
use crate::domain::subscription::SubscriptionError;
use crate::domain::usage::{LimitReport, NewUsage, UsageOperation};
use crate::ports::{CatalogReader, SubscriptionRepository};

use super::{EarningsDistributor, UsageLedger};

/// Command to record one operation against a model.
#[derive(Debug, Clone)]
pub struct TrackUsageCommand {
    pub user_id: UserId,
    pub model_id: ModelId,
    pub operation: UsageOperation,
    pub tokens_used: u64,
    pub response_time_ms: u64,
    pub success: bool,
    pub error_type: Option<String>,
    pub metadata: serde_json::Value,
}

/// Result of tracking usage.
#[derive(Debug, Clone)]
pub struct TrackUsageResult {
    pub usage_id: UsageRecordId,
    pub cost: Decimal,
    /// Limits after this operation was counted.
    pub limits: LimitReport,
}

/// Handler for usage tracking.
///
/// Inference needs a subscription that currently grants access; downloads
/// and views are metered for anyone. Only successful inference credits the
/// model creator; download fees stay with the marketplace.
pub struct TrackUsageHandler {
    catalog: Arc<dyn CatalogReader>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<UsageLedger>,
    distributor: Arc<EarningsDistributor>,
}

impl TrackUsageHandler {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        ledger: Arc<UsageLedger>,
        distributor: Arc<EarningsDistributor>,
    ) -> Self {
        Self {
            catalog,
            subscriptions,
            ledger,
            distributor,
        }
    }

    pub async fn handle(&self, cmd: TrackUsageCommand) -> Result<TrackUsageResult, SubscriptionError> {
        let now = Timestamp::now();

        if self.catalog.find_model(&cmd.model_id).await?.is_none() {
            return Err(SubscriptionError::not_found("Model"));
        }

        if cmd.operation.requires_subscription() {
            let entitled =
                find_entitled(self.subscriptions.as_ref(), &cmd.user_id, &cmd.model_id, now)
                    .await?;
            if entitled.is_none() {
                return Err(SubscriptionError::SubscriptionRequired(format!(
                    "An active subscription is required for {}",
                    cmd.operation
                )));
            }
        }

        let record = self
            .ledger
            .record_usage(
                NewUsage {
                    user_id: cmd.user_id.clone(),
                    model_id: cmd.model_id.clone(),
                    operation: cmd.operation,
                    tokens_used: cmd.tokens_used,
                    response_time_ms: cmd.response_time_ms,
                    success: cmd.success,
                    error_type: cmd.error_type,
                    metadata: cmd.metadata,
                },
                now,
            )
            .await?;

        if record.success && record.operation == UsageOperation::Inference {
            self.distributor.distribute(&record.model_id, record.cost).await;
        }

        let limits = self
            .ledger
            .check_limits(&cmd.user_id, &cmd.model_id, now)
            .await?;

        Ok(TrackUsageResult {
            usage_id: record.id,
            cost: record.cost,
            limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::*;
    use crate::domain::usage::CostSchedule;
    use serde_json::json;
    use std::str::FromStr;

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn handler(fx: &Fixture) -> TrackUsageHandler {
        let ledger = Arc::new(UsageLedger::new(
            fx.usage.clone(),
            fx.subscriptions.clone(),
            fx.catalog.clone(),
            CostSchedule::default(),
        ));
        let distributor = Arc::new(EarningsDistributor::new(
            fx.catalog.clone(),
            fx.earnings.clone(),
        ));
        TrackUsageHandler::new(fx.catalog.clone(), fx.subscriptions.clone(), ledger, distributor)
    }

    fn command(operation: UsageOperation) -> TrackUsageCommand {
        TrackUsageCommand {
            user_id: user(),
            model_id: model(),
            operation,
            tokens_used: 2000,
            response_time_ms: 500,
            success: true,
            error_type: None,
            metadata: json!({"client": "sdk"}),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn inference_with_subscription_is_priced_and_credited() {
        let fx = Fixture::seeded().await;
        fx.subscriptions
            .insert(active_subscription(Timestamp::now()))
            .await;

        let result = handler(&fx).handle(command(UsageOperation::Inference)).await.unwrap();

        assert_eq!(result.cost, dec("0.00205"));
        assert_eq!(result.limits.monthly.used, 1);
        assert_eq!(fx.earnings.balance(&creator()).await, dec("0.00164"));
    }

    #[tokio::test]
    async fn inference_without_subscription_is_forbidden() {
        let fx = Fixture::seeded().await;

        let err = handler(&fx)
            .handle(command(UsageOperation::Inference))
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::SubscriptionRequired(_)));
        assert!(fx.usage.records().await.is_empty());
    }

    #[tokio::test]
    async fn cancelled_subscription_still_allows_inference_until_period_end() {
        let fx = Fixture::seeded().await;
        let mut sub = active_subscription(Timestamp::now());
        sub.cancel(Timestamp::now()).unwrap();
        fx.subscriptions.insert(sub).await;

        let result = handler(&fx).handle(command(UsageOperation::Inference)).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn download_charges_flat_fee_and_credits_nothing() {
        let fx = Fixture::seeded().await;

        let result = handler(&fx).handle(command(UsageOperation::Download)).await.unwrap();

        assert_eq!(result.cost, dec("0.01"));
        assert_eq!(result.limits.monthly.limit, None);
        assert_eq!(fx.earnings.balance(&creator()).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn view_is_free_and_credits_nothing() {
        let fx = Fixture::seeded().await;

        let result = handler(&fx).handle(command(UsageOperation::View)).await.unwrap();

        assert_eq!(result.cost, Decimal::ZERO);
        assert_eq!(fx.earnings.balance(&creator()).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn failed_operation_is_recorded_but_not_credited() {
        let fx = Fixture::seeded().await;
        fx.subscriptions
            .insert(active_subscription(Timestamp::now()))
            .await;
        let mut cmd = command(UsageOperation::Inference);
        cmd.success = false;
        cmd.error_type = Some("timeout".to_string());

        handler(&fx).handle(cmd).await.unwrap();

        let records = fx.usage.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].error_type.as_deref(), Some("timeout"));
        assert_eq!(fx.earnings.balance(&creator()).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn unknown_model_is_not_found() {
        let fx = Fixture::seeded().await;
        let mut cmd = command(UsageOperation::View);
        cmd.model_id = ModelId::new("ghost").unwrap();

        let err = handler(&fx).handle(cmd).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::NotFound(_)));
    }
}
