//! Shared fixtures for handler tests.

use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::adapters::memory::{
    InMemoryCatalog, InMemoryEarningsLedger, InMemoryPaymentProvider, InMemoryPaymentRepository,
    InMemorySubscriptionRepository, InMemoryUsageRepository,
};
use crate::domain::billing::HelioEvent;
use crate::domain::foundation::{CreatorId, ModelId, PlanId, Timestamp, UserId};
use crate::domain::subscription::{ModelListing, Plan, RenewalDuration, Subscription};

pub const MODEL: &str = "model-1";
pub const PLAN: &str = "plan-pro";
pub const USER: &str = "user-1";
pub const CREATOR: &str = "creator-1";

pub fn user() -> UserId {
    UserId::new(USER).unwrap()
}

pub fn model() -> ModelId {
    ModelId::new(MODEL).unwrap()
}

pub fn plan_id() -> PlanId {
    PlanId::new(PLAN).unwrap()
}

pub fn creator() -> CreatorId {
    CreatorId::new(CREATOR).unwrap()
}

pub fn plan(requests_per_month: Option<u32>, requests_per_minute: Option<u32>) -> Plan {
    Plan {
        id: plan_id(),
        model_id: model(),
        name: "Pro".to_string(),
        base_price: Decimal::from(500),
        currency: "USDC".to_string(),
        requests_per_month,
        requests_per_minute,
    }
}

pub fn active_subscription(now: Timestamp) -> Subscription {
    Subscription::start(user(), model(), plan_id(), RenewalDuration::Month, None, now)
}

pub struct Fixture {
    pub payments: Arc<InMemoryPaymentRepository>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub catalog: Arc<InMemoryCatalog>,
    pub usage: Arc<InMemoryUsageRepository>,
    pub earnings: Arc<InMemoryEarningsLedger>,
    pub provider: Arc<InMemoryPaymentProvider>,
}

impl Fixture {
    /// Catalog holds one model with a plan limited to 1000/month and 10/minute.
    pub async fn seeded() -> Self {
        Self::with_plan(plan(Some(1000), Some(10))).await
    }

    pub async fn with_plan(plan: Plan) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog
            .add_model(ModelListing {
                id: model(),
                creator_id: creator(),
                name: "Sentiment Classifier".to_string(),
            })
            .await;
        catalog.add_plan(plan).await;

        Self {
            payments: Arc::new(InMemoryPaymentRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            catalog,
            usage: Arc::new(InMemoryUsageRepository::new()),
            earnings: Arc::new(InMemoryEarningsLedger::new()),
            provider: Arc::new(InMemoryPaymentProvider::new("https://pay.test")),
        }
    }
}

/// Helio webhook body with the standard checkout metadata merged with `extra`.
pub fn helio_payload(
    event: &str,
    transaction_id: &str,
    status: &str,
    subscription_ref: Option<&str>,
    extra: Value,
) -> Vec<u8> {
    let mut metadata = json!({
        "userId": USER,
        "modelId": MODEL,
        "planId": PLAN,
        "duration": "month",
    });
    if let (Some(base), Some(extra)) = (metadata.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }

    let mut body = json!({
        "event": event,
        "transactionObject": {
            "id": transaction_id,
            "paylinkId": "paylink-1",
            "meta": {
                "transactionStatus": status,
                "transactionSignature": "5xSig",
                "amount": "50",
                "currency": "USDC",
                "metadata": metadata,
            }
        }
    });
    if let Some(reference) = subscription_ref {
        body["subscriptionId"] = json!(reference);
    }
    serde_json::to_vec(&body).unwrap()
}

pub fn helio_event(event: &str, transaction_id: &str, status: &str) -> HelioEvent {
    HelioEvent::parse(&helio_payload(event, transaction_id, status, None, json!({}))).unwrap()
}
