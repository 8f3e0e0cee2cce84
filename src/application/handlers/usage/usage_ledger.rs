//! UsageLedger - prices and appends usage, and reports plan limits.

use chrono::Duration;
use std::sync::Arc;

use crate::application::handlers::subscription::find_entitled;
use crate::domain::foundation::{DomainError, ErrorCode, ModelId, Timestamp, UserId};
use crate::domain::usage::{
    CostSchedule, LimitReport, NewUsage, UsageCounts, UsageLimits, UsageRecord,
};
use crate::ports::{CatalogReader, SubscriptionRepository, UsageRepository};

/// Length of the sliding per-minute window.
const MINUTE_WINDOW_SECS: i64 = 60;

pub struct UsageLedger {
    usage: Arc<dyn UsageRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    catalog: Arc<dyn CatalogReader>,
    schedule: CostSchedule,
}

impl UsageLedger {
    pub fn new(
        usage: Arc<dyn UsageRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        catalog: Arc<dyn CatalogReader>,
        schedule: CostSchedule,
    ) -> Self {
        Self {
            usage,
            subscriptions,
            catalog,
            schedule,
        }
    }

    pub fn schedule(&self) -> &CostSchedule {
        &self.schedule
    }

    /// Prices one operation and appends it. The returned record carries
    /// the computed cost.
    pub async fn record_usage(
        &self,
        usage: NewUsage,
        now: Timestamp,
    ) -> Result<UsageRecord, DomainError> {
        let record = UsageRecord::price(usage, &self.schedule, now);
        self.usage.append(&record).await?;

        tracing::debug!(
            usage_id = %record.id,
            user_id = %record.user_id,
            model_id = %record.model_id,
            operation = %record.operation,
            cost = %record.cost,
            "Usage recorded"
        );
        Ok(record)
    }

    /// Compares calendar-month and last-minute request counts against the
    /// limits of the plan the user is entitled through. No entitlement
    /// means no limits apply.
    pub async fn check_limits(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
        now: Timestamp,
    ) -> Result<LimitReport, DomainError> {
        let limits = self.limits_for(user_id, model_id, now).await?;

        let month_start = now.start_of_month();
        let minute_start = now.minus(Duration::seconds(MINUTE_WINDOW_SECS));
        let (month, minute) = futures::future::try_join(
            self.usage.count_requests_since(user_id, model_id, month_start),
            self.usage.count_requests_since(user_id, model_id, minute_start),
        )
        .await?;

        Ok(LimitReport::evaluate(UsageCounts { month, minute }, limits))
    }

    async fn limits_for(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
        now: Timestamp,
    ) -> Result<UsageLimits, DomainError> {
        let Some(subscription) =
            find_entitled(self.subscriptions.as_ref(), user_id, model_id, now).await?
        else {
            return Ok(UsageLimits::unlimited());
        };

        let plan = self
            .catalog
            .find_plan(&subscription.plan_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::PlanNotFound, "Plan not found")
                    .with_detail("plan_id", subscription.plan_id.to_string())
            })?;
        Ok(plan.limits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::*;
    use crate::domain::usage::UsageOperation;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn ledger(fx: &Fixture) -> UsageLedger {
        UsageLedger::new(
            fx.usage.clone(),
            fx.subscriptions.clone(),
            fx.catalog.clone(),
            CostSchedule::default(),
        )
    }

    fn inference(tokens: u64, response_time_ms: u64) -> NewUsage {
        NewUsage {
            user_id: user(),
            model_id: model(),
            operation: UsageOperation::Inference,
            tokens_used: tokens,
            response_time_ms,
            success: true,
            error_type: None,
            metadata: json!({}),
        }
    }

    #[tokio::test]
    async fn record_usage_prices_and_appends() {
        let fx = Fixture::seeded().await;

        let record = ledger(&fx)
            .record_usage(inference(2000, 500), Timestamp::now())
            .await
            .unwrap();

        assert_eq!(record.cost, Decimal::from_str("0.00205").unwrap());
        assert_eq!(fx.usage.records().await.len(), 1);
    }

    #[tokio::test]
    async fn limits_follow_entitled_plan() {
        let fx = Fixture::seeded().await;
        fx.subscriptions
            .insert(active_subscription(Timestamp::now()))
            .await;
        let ledger = ledger(&fx);
        let now = Timestamp::now();
        for _ in 0..8 {
            ledger.record_usage(inference(10, 10), now).await.unwrap();
        }

        let report = ledger.check_limits(&user(), &model(), Timestamp::now()).await.unwrap();

        assert_eq!(report.monthly.used, 8);
        assert_eq!(report.monthly.limit, Some(1000));
        assert_eq!(report.per_minute.used, 8);
        assert!(report.is_near_limit);
        assert!(!report.minute_exceeded());
    }

    #[tokio::test]
    async fn minute_window_excludes_older_requests() {
        let fx = Fixture::seeded().await;
        fx.subscriptions
            .insert(active_subscription(Timestamp::now().minus_days(1)))
            .await;
        let ledger = ledger(&fx);
        let now = Timestamp::now();
        ledger
            .record_usage(inference(10, 10), now.minus(Duration::seconds(120)))
            .await
            .unwrap();
        ledger.record_usage(inference(10, 10), now).await.unwrap();

        let report = ledger.check_limits(&user(), &model(), now).await.unwrap();

        assert_eq!(report.per_minute.used, 1);
        assert!(report.monthly.used >= 1);
    }

    #[tokio::test]
    async fn no_subscription_means_unlimited() {
        let fx = Fixture::seeded().await;
        let ledger = ledger(&fx);
        ledger
            .record_usage(inference(10, 10), Timestamp::now())
            .await
            .unwrap();

        let report = ledger
            .check_limits(&user(), &model(), Timestamp::now())
            .await
            .unwrap();

        assert_eq!(report.monthly.limit, None);
        assert!(!report.monthly_exceeded());
        assert!(!report.is_near_limit);
    }
}
