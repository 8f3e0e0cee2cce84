//! HTTP DTOs (Data Transfer Objects) for marketplace endpoints.
//!
//! Field names are camelCase on the wire. Money is serialized as a JSON
//! number.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::handlers::subscription::{CheckAccessResult, RenewSubscriptionResult};
use crate::application::handlers::usage::TrackUsageResult;
use crate::domain::subscription::{Subscription, SubscriptionError, SubscriptionStatus};
use crate::domain::usage::LimitReport;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a renewal checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct RenewSubscriptionRequest {
    /// `hour`, `day`, `week` or `month`.
    pub duration: String,
}

/// Request to record one model operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackUsageRequest {
    pub model_id: String,
    pub operation: String,
    #[serde(default)]
    pub tokens_used: Option<i64>,
    /// Milliseconds.
    #[serde(default)]
    pub response_time: Option<i64>,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

fn default_success() -> bool {
    true
}

/// Reads an optional non-negative counter.
pub fn non_negative(value: Option<i64>, field: &str) -> Result<u64, SubscriptionError> {
    match value {
        None => Ok(0),
        Some(v) => u64::try_from(v)
            .map_err(|_| SubscriptionError::validation(field, "must not be negative")),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewSubscriptionResponse {
    pub subscription_id: String,
    pub payment_url: String,
    pub pay_link_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub duration: String,
}

impl From<RenewSubscriptionResult> for RenewSubscriptionResponse {
    fn from(result: RenewSubscriptionResult) -> Self {
        Self {
            subscription_id: result.subscription_id.to_string(),
            payment_url: result.payment_url,
            pay_link_id: result.pay_link_id,
            price: result.price,
            currency: result.currency,
            duration: result.duration.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackUsageResponse {
    pub usage_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub limits: LimitReport,
}

impl From<TrackUsageResult> for TrackUsageResponse {
    fn from(result: TrackUsageResult) -> Self {
        Self {
            usage_id: result.usage_id.to_string(),
            cost: result.cost,
            limits: result.limits,
        }
    }
}

/// Subscription as shown to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub id: String,
    pub model_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub current_period_start: String,
    pub current_period_end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<String>,
}

impl From<Subscription> for SubscriptionView {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id.to_string(),
            model_id: s.model_id.to_string(),
            plan_id: s.plan_id.to_string(),
            status: s.status,
            current_period_start: s.current_period_start.to_string(),
            current_period_end: s.current_period_end.to_string(),
            cancelled_at: s.cancelled_at.map(|t| t.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitReport>,
}

impl From<CheckAccessResult> for AccessResponse {
    fn from(result: CheckAccessResult) -> Self {
        Self {
            has_access: result.has_access,
            subscription: result.subscription.map(SubscriptionView::from),
            expires_at: result.expires_at.map(|t| t.to_string()),
            limits: result.limits,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn usage_request_accepts_minimal_body() {
        let request: TrackUsageRequest =
            serde_json::from_value(json!({"modelId": "m1", "operation": "view"})).unwrap();

        assert!(request.success);
        assert_eq!(request.tokens_used, None);
        assert!(request.metadata.is_none());
    }

    #[test]
    fn negative_counters_are_rejected() {
        assert_eq!(non_negative(None, "tokensUsed").unwrap(), 0);
        assert_eq!(non_negative(Some(42), "tokensUsed").unwrap(), 42);
        let err = non_negative(Some(-1), "tokensUsed").unwrap_err();
        assert!(matches!(err, SubscriptionError::ValidationFailed { .. }));
    }

    #[test]
    fn renew_response_serializes_price_as_number() {
        let response = RenewSubscriptionResponse {
            subscription_id: "s".into(),
            payment_url: "https://pay".into(),
            pay_link_id: "pl".into(),
            price: Decimal::new(1500, 2),
            currency: "USDC".into(),
            duration: "week".into(),
        };

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["price"], json!(15.0));
        assert_eq!(value["paymentUrl"], "https://pay");
    }
}
