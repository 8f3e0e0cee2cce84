//! SubscriptionReconciler - applies a recorded Helio event to subscriptions.
//!
//! | Event             | Settled? | Effect                                   |
//! |-------------------|----------|------------------------------------------|
//! | CREATED / STARTED | success  | open subscription (or renew the one named in metadata) |
//! | RENEWED           | success  | extend period from max(end, now)         |
//! | RENEWED           | failed   | mark past due                            |
//! | ENDED             | any      | cancel, keep period end                  |
//! | other             | any      | recorded, no transition                  |
//!
//! Pending activations are settled by asking Helio for the transaction
//! status. A slow or failing provider leaves the subscription untouched.
//!
//! A renewal aimed at a lapsed subscription whose pair has since gained a
//! newer active subscription extends the active one instead.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::billing::{HelioEvent, HelioEventKind, TransactionStatus, WebhookError};
use crate::domain::foundation::{SubscriptionId, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{
    CatalogReader, CreateOutcome, PaymentProvider, ProviderTransactionStatus,
    SubscriptionRepository,
};

/// How long after expiry a RENEWED event may still revive a subscription.
pub const DEFAULT_RENEWAL_LOOKBACK_DAYS: i64 = 30;

const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// What an event did to the subscription store.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Created(Subscription),
    Renewed(Subscription),
    Cancelled(Subscription),
    PastDue(Subscription),
    Unchanged { reason: String },
}

impl ReconcileOutcome {
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        match self {
            ReconcileOutcome::Created(s)
            | ReconcileOutcome::Renewed(s)
            | ReconcileOutcome::Cancelled(s)
            | ReconcileOutcome::PastDue(s) => Some(s.id),
            ReconcileOutcome::Unchanged { .. } => None,
        }
    }

    fn unchanged(reason: impl Into<String>) -> Self {
        ReconcileOutcome::Unchanged {
            reason: reason.into(),
        }
    }
}

pub struct SubscriptionReconciler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    catalog: Arc<dyn CatalogReader>,
    payment_provider: Arc<dyn PaymentProvider>,
    status_timeout: Duration,
    renewal_lookback_days: i64,
}

impl SubscriptionReconciler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        catalog: Arc<dyn CatalogReader>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            subscriptions,
            catalog,
            payment_provider,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            renewal_lookback_days: DEFAULT_RENEWAL_LOOKBACK_DAYS,
        }
    }

    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }

    pub fn with_renewal_lookback_days(mut self, days: i64) -> Self {
        self.renewal_lookback_days = days;
        self
    }

    /// Applies the event. Call only while holding the payment's
    /// reconciliation claim, and only for a payment not yet reconciled.
    pub async fn reconcile(&self, event: &HelioEvent) -> Result<ReconcileOutcome, WebhookError> {
        let now = Timestamp::now();
        match &event.kind {
            HelioEventKind::Created | HelioEventKind::Started => {
                match self.settlement(event).await {
                    ProviderTransactionStatus::Success => {}
                    other => {
                        tracing::info!(
                            transaction_id = %event.transaction_id,
                            status = ?other,
                            "Activation not settled, no subscription change"
                        );
                        return Ok(ReconcileOutcome::unchanged("transaction not settled"));
                    }
                }
                if event.metadata.get("subscriptionId").is_some() {
                    return self.renew(event, now).await;
                }
                self.activate(event, now).await
            }
            HelioEventKind::Renewed => match self.settlement(event).await {
                ProviderTransactionStatus::Success => self.renew(event, now).await,
                ProviderTransactionStatus::Failed => self.mark_past_due(event, now).await,
                _ => Ok(ReconcileOutcome::unchanged("renewal not settled")),
            },
            HelioEventKind::Ended => self.end(event, now).await,
            HelioEventKind::Unrecognized(kind) => {
                tracing::info!(
                    transaction_id = %event.transaction_id,
                    event = %kind,
                    "Unrecognized Helio event recorded without transition"
                );
                Ok(ReconcileOutcome::unchanged(format!("unrecognized event {}", kind)))
            }
        }
    }

    async fn settlement(&self, event: &HelioEvent) -> ProviderTransactionStatus {
        match &event.status {
            TransactionStatus::Success => ProviderTransactionStatus::Success,
            TransactionStatus::Failed => ProviderTransactionStatus::Failed,
            TransactionStatus::Pending | TransactionStatus::Other(_) => {
                let lookup = self.payment_provider.transaction_status(&event.transaction_id);
                match tokio::time::timeout(self.status_timeout, lookup).await {
                    Ok(Ok(status)) => status,
                    Ok(Err(e)) => {
                        tracing::warn!(
                            transaction_id = %event.transaction_id,
                            error = %e,
                            "Transaction status lookup failed"
                        );
                        ProviderTransactionStatus::Unknown
                    }
                    Err(_) => {
                        tracing::warn!(
                            transaction_id = %event.transaction_id,
                            timeout_ms = self.status_timeout.as_millis() as u64,
                            "Transaction status lookup timed out"
                        );
                        ProviderTransactionStatus::Unknown
                    }
                }
            }
        }
    }

    async fn activate(
        &self,
        event: &HelioEvent,
        now: Timestamp,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let user_id = event
            .metadata
            .user_id()
            .ok_or(WebhookError::MissingMetadata("userId"))?;
        let model_id = event
            .metadata
            .model_id()
            .ok_or(WebhookError::MissingMetadata("modelId"))?;
        let plan_id = event
            .metadata
            .plan_id()
            .ok_or(WebhookError::MissingMetadata("planId"))?;

        if self.catalog.find_model(&model_id).await?.is_none() {
            return Err(WebhookError::ReferenceNotFound(format!("model {}", model_id)));
        }
        let plan = self
            .catalog
            .find_plan(&plan_id)
            .await?
            .ok_or_else(|| WebhookError::ReferenceNotFound(format!("plan {}", plan_id)))?;
        if !plan.belongs_to(&model_id) {
            return Err(WebhookError::ReferenceNotFound(format!(
                "plan {} for model {}",
                plan_id, model_id
            )));
        }

        let reference = event
            .subscription_ref
            .clone()
            .unwrap_or_else(|| event.transaction_id.clone());
        let subscription = Subscription::start(
            user_id,
            model_id,
            plan_id,
            event.duration,
            Some(reference),
            now,
        );

        match self.subscriptions.create_if_no_active(&subscription).await? {
            CreateOutcome::Created => {
                tracing::info!(
                    subscription_id = %subscription.id,
                    user_id = %subscription.user_id,
                    model_id = %subscription.model_id,
                    period_end = %subscription.current_period_end,
                    "Subscription created"
                );
                Ok(ReconcileOutcome::Created(subscription))
            }
            CreateOutcome::ActiveExists => Err(WebhookError::DuplicateSubscription),
        }
    }

    async fn renew(
        &self,
        event: &HelioEvent,
        now: Timestamp,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let mut subscription = self.locate(event, now).await?;
        if !subscription.is_active() {
            // A paid renewal of a superseded subscription extends the pair's
            // current one; reviving both would break one-active-per-pair.
            if let Some(active) = self
                .subscriptions
                .find_active(&subscription.user_id, &subscription.model_id)
                .await?
                .filter(|active| active.id != subscription.id)
            {
                tracing::warn!(
                    superseded_subscription_id = %subscription.id,
                    subscription_id = %active.id,
                    transaction_id = %event.transaction_id,
                    "Renewal paid for superseded subscription, extending the active one"
                );
                subscription = active;
            }
        }
        let previous_end = subscription.current_period_end;

        if let Err(e) = subscription.renew(event.duration, now) {
            tracing::warn!(subscription_id = %subscription.id, error = %e, "Renewal rejected");
            return Ok(ReconcileOutcome::unchanged(e.message));
        }
        if subscription.external_reference.is_none() {
            subscription.external_reference = event.subscription_ref.clone();
        }
        self.subscriptions.update(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            previous_end = %previous_end,
            period_end = %subscription.current_period_end,
            duration = %event.duration,
            "Subscription renewed"
        );
        Ok(ReconcileOutcome::Renewed(subscription))
    }

    async fn mark_past_due(
        &self,
        event: &HelioEvent,
        now: Timestamp,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let mut subscription = self.locate(event, now).await?;
        if subscription.status != SubscriptionStatus::Active {
            return Ok(ReconcileOutcome::unchanged(format!(
                "subscription is {}",
                subscription.status
            )));
        }
        if let Err(e) = subscription.mark_past_due(now) {
            return Ok(ReconcileOutcome::unchanged(e.message));
        }
        self.subscriptions.update(&subscription).await?;

        tracing::warn!(subscription_id = %subscription.id, "Renewal charge failed, subscription past due");
        Ok(ReconcileOutcome::PastDue(subscription))
    }

    async fn end(
        &self,
        event: &HelioEvent,
        now: Timestamp,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let mut subscription = self.locate(event, now).await?;
        if matches!(
            subscription.status,
            SubscriptionStatus::Cancelled | SubscriptionStatus::Expired
        ) {
            return Ok(ReconcileOutcome::unchanged(format!(
                "subscription already {}",
                subscription.status
            )));
        }
        if let Err(e) = subscription.cancel(now) {
            return Ok(ReconcileOutcome::unchanged(e.message));
        }
        self.subscriptions.update(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            period_end = %subscription.current_period_end,
            "Subscription cancelled"
        );
        Ok(ReconcileOutcome::Cancelled(subscription))
    }

    /// Finds the subscription an event refers to: by our id in metadata,
    /// then by the Helio subscription reference, then by the latest
    /// user/model subscription that has not been expired for too long.
    async fn locate(&self, event: &HelioEvent, now: Timestamp) -> Result<Subscription, WebhookError> {
        if let Some(raw) = event.metadata.get("subscriptionId") {
            let id: SubscriptionId = raw
                .parse()
                .map_err(|_| WebhookError::MalformedPayload(format!("invalid subscriptionId '{}'", raw)))?;
            return self
                .subscriptions
                .find_by_id(&id)
                .await?
                .ok_or_else(|| WebhookError::ReferenceNotFound(format!("subscription {}", id)));
        }

        if let Some(reference) = &event.subscription_ref {
            if let Some(found) = self.subscriptions.find_by_external_reference(reference).await? {
                return Ok(found);
            }
        }

        if let (Some(user_id), Some(model_id)) =
            (event.metadata.user_id(), event.metadata.model_id())
        {
            let expired_since = now.minus_days(self.renewal_lookback_days);
            if let Some(found) = self
                .subscriptions
                .find_latest_renewable(&user_id, &model_id, expired_since)
                .await?
            {
                return Ok(found);
            }
        }

        Err(WebhookError::ReferenceNotFound(format!(
            "subscription for transaction {}",
            event.transaction_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::*;
    use crate::ports::{PayLink, PayLinkRequest, PaymentProviderError};
    use async_trait::async_trait;
    use serde_json::json;

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn reconciler(fx: &Fixture) -> SubscriptionReconciler {
        SubscriptionReconciler::new(
            fx.subscriptions.clone(),
            fx.catalog.clone(),
            fx.provider.clone(),
        )
    }

    fn event_with(
        kind: &str,
        tx: &str,
        status: &str,
        subscription_ref: Option<&str>,
        extra: serde_json::Value,
    ) -> HelioEvent {
        HelioEvent::parse(&helio_payload(kind, tx, status, subscription_ref, extra)).unwrap()
    }

    /// Provider that never answers in time.
    struct StalledProvider;

    #[async_trait]
    impl PaymentProvider for StalledProvider {
        async fn create_pay_link(
            &self,
            _request: PayLinkRequest,
        ) -> Result<PayLink, PaymentProviderError> {
            Err(PaymentProviderError::Timeout)
        }

        async fn transaction_status(
            &self,
            _transaction_id: &str,
        ) -> Result<ProviderTransactionStatus, PaymentProviderError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ProviderTransactionStatus::Success)
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Activation
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn started_event_creates_month_subscription() {
        let fx = Fixture::seeded().await;
        let before = Timestamp::now();

        let outcome = reconciler(&fx)
            .reconcile(&helio_event("STARTED", "tx-1", "SUCCESS"))
            .await
            .unwrap();

        let ReconcileOutcome::Created(sub) = outcome else {
            panic!("expected Created, got {:?}", outcome);
        };
        assert_eq!(sub.user_id, user());
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.current_period_end >= before.plus_months(1));
        assert_eq!(sub.external_reference.as_deref(), Some("tx-1"));
        assert_eq!(fx.subscriptions.all().await.len(), 1);
    }

    #[tokio::test]
    async fn created_with_helio_subscription_keeps_its_reference() {
        let fx = Fixture::seeded().await;

        let outcome = reconciler(&fx)
            .reconcile(&event_with("CREATED", "tx-1", "SUCCESS", Some("helio-sub-9"), json!({})))
            .await
            .unwrap();

        let ReconcileOutcome::Created(sub) = outcome else {
            panic!("expected Created");
        };
        assert_eq!(sub.external_reference.as_deref(), Some("helio-sub-9"));
    }

    #[tokio::test]
    async fn second_activation_for_same_pair_is_duplicate() {
        let fx = Fixture::seeded().await;
        let reconciler = reconciler(&fx);
        reconciler
            .reconcile(&helio_event("STARTED", "tx-1", "SUCCESS"))
            .await
            .unwrap();

        let err = reconciler
            .reconcile(&helio_event("CREATED", "tx-2", "SUCCESS"))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::DuplicateSubscription));
        assert_eq!(fx.subscriptions.all().await.len(), 1);
    }

    #[tokio::test]
    async fn activation_for_unknown_model_is_reference_not_found() {
        let fx = Fixture::seeded().await;
        let event = event_with("STARTED", "tx-1", "SUCCESS", None, json!({"modelId": "ghost"}));

        let err = reconciler(&fx).reconcile(&event).await.unwrap_err();

        assert!(matches!(err, WebhookError::ReferenceNotFound(_)));
    }

    #[tokio::test]
    async fn activation_with_plan_of_other_model_is_reference_not_found() {
        let fx = Fixture::seeded().await;
        let mut foreign = plan(None, None);
        foreign.id = crate::domain::foundation::PlanId::new("plan-foreign").unwrap();
        foreign.model_id = crate::domain::foundation::ModelId::new("model-2").unwrap();
        fx.catalog.add_plan(foreign).await;
        let event = event_with("STARTED", "tx-1", "SUCCESS", None, json!({"planId": "plan-foreign"}));

        let err = reconciler(&fx).reconcile(&event).await.unwrap_err();

        assert!(matches!(err, WebhookError::ReferenceNotFound(_)));
    }

    #[tokio::test]
    async fn activation_without_user_is_missing_metadata() {
        let fx = Fixture::seeded().await;
        let event = event_with("STARTED", "tx-1", "SUCCESS", None, json!({"userId": ""}));

        let err = reconciler(&fx).reconcile(&event).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingMetadata("userId")));
    }

    #[tokio::test]
    async fn failed_activation_changes_nothing() {
        let fx = Fixture::seeded().await;

        let outcome = reconciler(&fx)
            .reconcile(&helio_event("CREATED", "tx-1", "FAILED"))
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Unchanged { .. }));
        assert!(fx.subscriptions.all().await.is_empty());
    }

    #[tokio::test]
    async fn pending_activation_settled_by_provider() {
        let fx = Fixture::seeded().await;
        fx.provider
            .set_status("tx-1", ProviderTransactionStatus::Success)
            .await;

        let outcome = reconciler(&fx)
            .reconcile(&helio_event("CREATED", "tx-1", "PENDING"))
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Created(_)));
    }

    #[tokio::test]
    async fn pending_activation_with_unknown_status_changes_nothing() {
        let fx = Fixture::seeded().await;

        let outcome = reconciler(&fx)
            .reconcile(&helio_event("CREATED", "tx-1", "PENDING"))
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Unchanged { .. }));
    }

    #[tokio::test]
    async fn stalled_status_lookup_times_out() {
        let fx = Fixture::seeded().await;
        let reconciler = SubscriptionReconciler::new(
            fx.subscriptions.clone(),
            fx.catalog.clone(),
            Arc::new(StalledProvider),
        )
        .with_status_timeout(Duration::from_millis(20));

        let outcome = reconciler
            .reconcile(&helio_event("CREATED", "tx-1", "PENDING"))
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Unchanged { .. }));
        assert!(fx.subscriptions.all().await.is_empty());
    }

    #[tokio::test]
    async fn created_with_subscription_id_renews_that_subscription() {
        let fx = Fixture::seeded().await;
        let sub = active_subscription(Timestamp::now());
        let old_end = sub.current_period_end;
        fx.subscriptions.insert(sub.clone()).await;
        let event = event_with(
            "CREATED",
            "tx-renew",
            "SUCCESS",
            None,
            json!({"subscriptionId": sub.id.to_string(), "duration": "week"}),
        );

        let outcome = reconciler(&fx).reconcile(&event).await.unwrap();

        let ReconcileOutcome::Renewed(renewed) = outcome else {
            panic!("expected Renewed");
        };
        assert_eq!(renewed.id, sub.id);
        assert_eq!(renewed.current_period_end, old_end.plus_days(7));
    }

    #[tokio::test]
    async fn renewal_of_superseded_subscription_extends_the_active_one() {
        let fx = Fixture::seeded().await;
        let opened = Timestamp::now().minus_days(40);
        let mut old = active_subscription(opened);
        old.expire(opened.plus_days(31)).unwrap();
        fx.subscriptions.insert(old.clone()).await;
        let reconciler = reconciler(&fx);

        let ReconcileOutcome::Created(current) = reconciler
            .reconcile(&helio_event("STARTED", "tx-new", "SUCCESS"))
            .await
            .unwrap()
        else {
            panic!("expected Created");
        };
        let event = event_with(
            "CREATED",
            "tx-renew",
            "SUCCESS",
            None,
            json!({"subscriptionId": old.id.to_string(), "duration": "week"}),
        );

        let outcome = reconciler.reconcile(&event).await.unwrap();

        let ReconcileOutcome::Renewed(renewed) = outcome else {
            panic!("expected Renewed, got {:?}", outcome);
        };
        assert_eq!(renewed.id, current.id);
        assert_eq!(renewed.current_period_end, current.current_period_end.plus_days(7));
        let all = fx.subscriptions.all().await;
        assert_eq!(all.iter().filter(|s| s.is_active()).count(), 1);
        let stale = all.iter().find(|s| s.id == old.id).unwrap();
        assert_eq!(stale.status, SubscriptionStatus::Expired);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Renewal
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn renewed_extends_from_current_end_when_time_remains() {
        let fx = Fixture::seeded().await;
        let opened = Timestamp::now().minus_days(20);
        let mut sub = active_subscription(opened);
        sub.external_reference = Some("helio-sub-1".to_string());
        let old_end = sub.current_period_end;
        fx.subscriptions.insert(sub.clone()).await;

        let outcome = reconciler(&fx)
            .reconcile(&event_with("RENEWED", "tx-2", "SUCCESS", Some("helio-sub-1"), json!({})))
            .await
            .unwrap();

        let ReconcileOutcome::Renewed(renewed) = outcome else {
            panic!("expected Renewed");
        };
        assert_eq!(renewed.current_period_end, old_end.plus_months(1));
        assert_eq!(renewed.current_period_start, sub.current_period_start);
    }

    #[tokio::test]
    async fn renewed_revives_recently_expired_subscription_from_now() {
        let fx = Fixture::seeded().await;
        let opened = Timestamp::now().minus_days(40);
        let mut sub = active_subscription(opened);
        sub.expire(opened.plus_days(32)).unwrap();
        fx.subscriptions.insert(sub.clone()).await;
        let before = Timestamp::now();

        let outcome = reconciler(&fx)
            .reconcile(&helio_event("RENEWED", "tx-2", "SUCCESS"))
            .await
            .unwrap();

        let ReconcileOutcome::Renewed(renewed) = outcome else {
            panic!("expected Renewed");
        };
        assert_eq!(renewed.status, SubscriptionStatus::Active);
        assert!(renewed.current_period_start >= before);
        assert!(renewed.current_period_end >= before.plus_months(1));
    }

    #[tokio::test]
    async fn renewed_ignores_long_expired_subscription() {
        let fx = Fixture::seeded().await;
        let opened = Timestamp::now().minus_days(120);
        let mut sub = active_subscription(opened);
        sub.expire(opened.plus_days(31)).unwrap();
        fx.subscriptions.insert(sub).await;

        let err = reconciler(&fx)
            .reconcile(&helio_event("RENEWED", "tx-2", "SUCCESS"))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::ReferenceNotFound(_)));
    }

    #[tokio::test]
    async fn renewed_without_subscription_is_reference_not_found() {
        let fx = Fixture::seeded().await;

        let err = reconciler(&fx)
            .reconcile(&helio_event("RENEWED", "tx-2", "SUCCESS"))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::ReferenceNotFound(_)));
    }

    #[tokio::test]
    async fn failed_renewal_marks_past_due() {
        let fx = Fixture::seeded().await;
        fx.subscriptions
            .insert(active_subscription(Timestamp::now()))
            .await;

        let outcome = reconciler(&fx)
            .reconcile(&helio_event("RENEWED", "tx-2", "FAILED"))
            .await
            .unwrap();

        let ReconcileOutcome::PastDue(sub) = outcome else {
            panic!("expected PastDue");
        };
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Ending
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn ended_cancels_and_keeps_period_end() {
        let fx = Fixture::seeded().await;
        let sub = active_subscription(Timestamp::now());
        fx.subscriptions.insert(sub.clone()).await;

        let outcome = reconciler(&fx)
            .reconcile(&helio_event("ENDED", "tx-3", "SUCCESS"))
            .await
            .unwrap();

        let ReconcileOutcome::Cancelled(cancelled) = outcome else {
            panic!("expected Cancelled");
        };
        assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
        assert_eq!(cancelled.current_period_end, sub.current_period_end);
        assert!(cancelled.cancelled_at.is_some());
        assert!(cancelled.has_access(Timestamp::now()));
    }

    #[tokio::test]
    async fn ended_on_cancelled_subscription_is_noop() {
        let fx = Fixture::seeded().await;
        let mut sub = active_subscription(Timestamp::now());
        sub.cancel(Timestamp::now()).unwrap();
        fx.subscriptions.insert(sub).await;

        let outcome = reconciler(&fx)
            .reconcile(&helio_event("ENDED", "tx-3", "SUCCESS"))
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Unchanged { .. }));
    }

    #[tokio::test]
    async fn ended_without_subscription_is_reference_not_found() {
        let fx = Fixture::seeded().await;

        let err = reconciler(&fx)
            .reconcile(&helio_event("ENDED", "tx-3", "SUCCESS"))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::ReferenceNotFound(_)));
    }

    #[tokio::test]
    async fn unrecognized_event_changes_nothing() {
        let fx = Fixture::seeded().await;

        let outcome = reconciler(&fx)
            .reconcile(&helio_event("REFUNDED", "tx-4", "SUCCESS"))
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Unchanged { .. }));
        assert!(fx.subscriptions.all().await.is_empty());
    }
}
