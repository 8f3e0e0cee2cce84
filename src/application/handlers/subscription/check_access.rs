//! CheckAccessHandler - Query handler for model access checks.

use std::sync::Arc;

use crate::domain::foundation::{ModelId, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionError};
use crate::domain::usage::LimitReport;
use crate::ports::SubscriptionRepository;

use super::find_entitled;
use crate::application::handlers::usage::UsageLedger;

/// Retry hint for the sliding per-minute window.
const MINUTE_RETRY_SECS: u64 = 60;

/// Query to check if a user may use a model.
#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub user_id: UserId,
    pub model_id: ModelId,
}

/// Result of access check.
#[derive(Debug, Clone)]
pub struct CheckAccessResult {
    pub has_access: bool,
    pub subscription: Option<Subscription>,
    pub expires_at: Option<Timestamp>,
    /// Present when the user has access.
    pub limits: Option<LimitReport>,
}

impl CheckAccessResult {
    fn denied() -> Self {
        Self {
            has_access: false,
            subscription: None,
            expires_at: None,
            limits: None,
        }
    }
}

/// Handler for access checks.
///
/// Access requires a subscription that grants access right now. An exhausted
/// plan limit turns the check into a rate-limit error rather than a plain
/// denial so callers can back off.
pub struct CheckAccessHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<UsageLedger>,
}

impl CheckAccessHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, ledger: Arc<UsageLedger>) -> Self {
        Self {
            subscriptions,
            ledger,
        }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> Result<CheckAccessResult, SubscriptionError> {
        let now = Timestamp::now();

        let Some(subscription) =
            find_entitled(self.subscriptions.as_ref(), &query.user_id, &query.model_id, now)
                .await?
        else {
            return Ok(CheckAccessResult::denied());
        };

        let limits = self
            .ledger
            .check_limits(&query.user_id, &query.model_id, now)
            .await?;

        if limits.monthly_exceeded() {
            let reset = now.start_of_next_month();
            let retry_after_secs = reset.duration_since(&now).num_seconds().max(1) as u64;
            tracing::info!(
                user_id = %query.user_id,
                model_id = %query.model_id,
                used = limits.monthly.used,
                "Monthly request limit reached"
            );
            return Err(SubscriptionError::RateLimitExceeded { retry_after_secs });
        }
        if limits.minute_exceeded() {
            return Err(SubscriptionError::TooManyRequests {
                retry_after_secs: MINUTE_RETRY_SECS,
            });
        }

        Ok(CheckAccessResult {
            has_access: true,
            expires_at: Some(subscription.current_period_end),
            subscription: Some(subscription),
            limits: Some(limits),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::*;
    use crate::domain::usage::{CostSchedule, NewUsage, UsageOperation};
    use serde_json::json;

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn ledger(fx: &Fixture) -> Arc<UsageLedger> {
        Arc::new(UsageLedger::new(
            fx.usage.clone(),
            fx.subscriptions.clone(),
            fx.catalog.clone(),
            CostSchedule::default(),
        ))
    }

    fn query() -> CheckAccessQuery {
        CheckAccessQuery {
            user_id: user(),
            model_id: model(),
        }
    }

    async fn use_model(ledger: &UsageLedger, times: usize) {
        for _ in 0..times {
            ledger
                .record_usage(
                    NewUsage {
                        user_id: user(),
                        model_id: model(),
                        operation: UsageOperation::Inference,
                        tokens_used: 1,
                        response_time_ms: 1,
                        success: true,
                        error_type: None,
                        metadata: json!({}),
                    },
                    Timestamp::now(),
                )
                .await
                .unwrap();
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn returns_access_with_expiry_for_active_subscription() {
        let fx = Fixture::seeded().await;
        let sub = active_subscription(Timestamp::now());
        fx.subscriptions.insert(sub.clone()).await;
        let handler = CheckAccessHandler::new(fx.subscriptions.clone(), ledger(&fx));

        let result = handler.handle(query()).await.unwrap();

        assert!(result.has_access);
        assert_eq!(result.expires_at, Some(sub.current_period_end));
        assert_eq!(result.subscription.map(|s| s.id), Some(sub.id));
        assert!(result.limits.is_some());
    }

    #[tokio::test]
    async fn returns_no_access_without_subscription() {
        let fx = Fixture::seeded().await;
        let handler = CheckAccessHandler::new(fx.subscriptions.clone(), ledger(&fx));

        let result = handler.handle(query()).await.unwrap();

        assert!(!result.has_access);
        assert!(result.subscription.is_none());
        assert!(result.expires_at.is_none());
    }

    #[tokio::test]
    async fn returns_no_access_after_period_end() {
        let fx = Fixture::seeded().await;
        fx.subscriptions
            .insert(active_subscription(Timestamp::now().minus_days(45)))
            .await;
        let handler = CheckAccessHandler::new(fx.subscriptions.clone(), ledger(&fx));

        let result = handler.handle(query()).await.unwrap();

        assert!(!result.has_access);
    }

    #[tokio::test]
    async fn exhausted_minute_window_is_too_many_requests() {
        let fx = Fixture::seeded().await;
        fx.subscriptions
            .insert(active_subscription(Timestamp::now()))
            .await;
        let ledger = ledger(&fx);
        use_model(&ledger, 10).await;
        let handler = CheckAccessHandler::new(fx.subscriptions.clone(), ledger);

        let err = handler.handle(query()).await.unwrap_err();

        assert_eq!(err, SubscriptionError::TooManyRequests { retry_after_secs: 60 });
    }

    #[tokio::test]
    async fn exhausted_month_is_rate_limit_exceeded() {
        let fx = Fixture::with_plan(plan(Some(3), None)).await;
        fx.subscriptions
            .insert(active_subscription(Timestamp::now()))
            .await;
        let ledger = ledger(&fx);
        use_model(&ledger, 3).await;
        let handler = CheckAccessHandler::new(fx.subscriptions.clone(), ledger);

        let err = handler.handle(query()).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::RateLimitExceeded { .. }));
        assert!(err.retry_after_secs().unwrap() > 0);
    }

    #[tokio::test]
    async fn unlimited_plan_never_throttles() {
        let fx = Fixture::with_plan(plan(None, None)).await;
        fx.subscriptions
            .insert(active_subscription(Timestamp::now()))
            .await;
        let ledger = ledger(&fx);
        use_model(&ledger, 50).await;
        let handler = CheckAccessHandler::new(fx.subscriptions.clone(), ledger);

        let result = handler.handle(query()).await.unwrap();

        assert!(result.has_access);
        assert!(!result.limits.unwrap().is_near_limit);
    }
}
