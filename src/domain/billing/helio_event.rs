//! Helio webhook event types.
//!
//! Decodes the raw (already verified) webhook body into a typed event.
//! Only fields relevant to our processing are captured; unknown fields
//! are ignored.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::webhook_errors::WebhookError;
use crate::domain::foundation::{ModelId, PlanId, UserId};
use crate::domain::subscription::RenewalDuration;

/// Currency assumed when the transaction does not state one.
const DEFAULT_CURRENCY: &str = "USDC";

/// Kind of Helio webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelioEventKind {
    /// One-off payment for a new subscription.
    Created,
    /// Recurring subscription started.
    Started,
    /// Recurring subscription charged for another period.
    Renewed,
    /// Recurring subscription ended by the payer or provider.
    Ended,
    /// Anything else. Recorded but never acted upon.
    Unrecognized(String),
}

impl HelioEventKind {
    /// Parse event kind from the wire value (case-insensitive).
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Self::Created,
            "STARTED" => Self::Started,
            "RENEWED" => Self::Renewed,
            "ENDED" => Self::Ended,
            _ => Self::Unrecognized(s.to_string()),
        }
    }

    /// Wire representation, used for persistence.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "CREATED",
            Self::Started => "STARTED",
            Self::Renewed => "RENEWED",
            Self::Ended => "ENDED",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// True for events that open a new subscription.
    pub fn is_activation(&self) -> bool {
        matches!(self, Self::Created | Self::Started)
    }
}

/// Outcome of the on-chain transaction as reported by Helio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Success,
    Pending,
    Failed,
    Other(String),
}

impl TransactionStatus {
    /// Parse status from the wire value (case-insensitive).
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" | "COMPLETED" | "PAID" => Self::Success,
            "PENDING" | "PROCESSING" => Self::Pending,
            "FAILED" | "CANCELED" | "CANCELLED" | "EXPIRED" => Self::Failed,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "SUCCESS",
            Self::Pending => "PENDING",
            Self::Failed => "FAILED",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Merchant metadata attached to the paylink at checkout.
///
/// Values are normalised to strings; Helio echoes whatever JSON the
/// checkout supplied, so numbers are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentMetadata {
    entries: HashMap<String, String>,
}

impl PaymentMetadata {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Raw metadata lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.get("userId").and_then(|v| UserId::new(v).ok())
    }

    pub fn model_id(&self) -> Option<ModelId> {
        self.get("modelId").and_then(|v| ModelId::new(v).ok())
    }

    pub fn plan_id(&self) -> Option<PlanId> {
        self.get("planId").and_then(|v| PlanId::new(v).ok())
    }

    pub fn entries(&self) -> &HashMap<String, String> {
        &self.entries
    }
}

/// A decoded Helio webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct HelioEvent {
    pub kind: HelioEventKind,
    /// Helio transaction id; the idempotency key for payments.
    pub transaction_id: String,
    pub paylink_id: String,
    /// Recurring subscription reference, present on subscription events.
    pub subscription_ref: Option<String>,
    pub status: TransactionStatus,
    pub blockchain_signature: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    /// Paid period length. Defaults to a month when the checkout did not say.
    pub duration: RenewalDuration,
    pub metadata: PaymentMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    event: String,
    #[serde(default)]
    subscription_id: Option<String>,
    transaction_object: RawTransaction,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    id: String,
    paylink_id: String,
    meta: RawMeta,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeta {
    transaction_status: String,
    #[serde(default)]
    transaction_signature: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, Value>,
}

impl HelioEvent {
    /// Decodes a raw webhook body.
    ///
    /// # Errors
    ///
    /// `MalformedPayload` when the body is not JSON, a required field is
    /// absent or empty, or the amount/duration cannot be interpreted.
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        let raw: RawEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        let transaction_id = require_non_empty(raw.transaction_object.id, "transactionObject.id")?;
        let paylink_id = require_non_empty(
            raw.transaction_object.paylink_id,
            "transactionObject.paylinkId",
        )?;
        let event = require_non_empty(raw.event, "event")?;
        let meta = raw.transaction_object.meta;

        let metadata = PaymentMetadata::new(
            meta.metadata
                .into_iter()
                .filter_map(|(k, v)| stringify(v).map(|v| (k, v)))
                .collect(),
        );

        let duration = match metadata.get("duration") {
            Some(label) => RenewalDuration::from_str(label)
                .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?,
            None => RenewalDuration::Month,
        };

        let amount = match meta.amount {
            None | Some(Value::Null) => Decimal::ZERO,
            Some(value) => parse_amount(&value)?,
        };

        Ok(HelioEvent {
            kind: HelioEventKind::from_wire(&event),
            transaction_id,
            paylink_id,
            subscription_ref: raw.subscription_id.filter(|s| !s.trim().is_empty()),
            status: TransactionStatus::from_wire(&meta.transaction_status),
            blockchain_signature: meta.transaction_signature.filter(|s| !s.is_empty()),
            amount,
            currency: meta
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            duration,
            metadata,
        })
    }
}

fn require_non_empty(value: String, field: &str) -> Result<String, WebhookError> {
    if value.trim().is_empty() {
        Err(WebhookError::MalformedPayload(format!("{} is empty", field)))
    } else {
        Ok(value)
    }
}

fn stringify(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_amount(value: &Value) -> Result<Decimal, WebhookError> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(WebhookError::MalformedPayload(format!(
                "amount must be a number or string, got {}",
                other
            )))
        }
    };
    Decimal::from_str(&text)
        .map_err(|_| WebhookError::MalformedPayload(format!("invalid amount '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(event: &str, status: &str) -> Vec<u8> {
        json!({
            "event": event,
            "transactionObject": {
                "id": "tx_123",
                "paylinkId": "pl_456",
                "meta": {
                    "transactionStatus": status,
                    "transactionSignature": "5Kj9sig",
                    "amount": "25.50",
                    "currency": "USDC",
                    "metadata": {
                        "userId": "user-1",
                        "modelId": "model-1",
                        "planId": "plan-1",
                        "duration": "week"
                    }
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    // ══════════════════════════════════════════════════════════════
    // Successful Parsing
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parses_full_started_event() {
        let event = HelioEvent::parse(&payload("STARTED", "SUCCESS")).unwrap();

        assert_eq!(event.kind, HelioEventKind::Started);
        assert_eq!(event.transaction_id, "tx_123");
        assert_eq!(event.paylink_id, "pl_456");
        assert!(event.status.is_success());
        assert_eq!(event.blockchain_signature.as_deref(), Some("5Kj9sig"));
        assert_eq!(event.amount, Decimal::new(2550, 2));
        assert_eq!(event.duration, RenewalDuration::Week);
        assert_eq!(event.metadata.user_id().unwrap().as_str(), "user-1");
        assert_eq!(event.metadata.model_id().unwrap().as_str(), "model-1");
        assert_eq!(event.metadata.plan_id().unwrap().as_str(), "plan-1");
    }

    #[test]
    fn event_kind_matching_is_case_insensitive() {
        assert_eq!(HelioEventKind::from_wire("renewed"), HelioEventKind::Renewed);
        assert_eq!(HelioEventKind::from_wire("Ended"), HelioEventKind::Ended);
    }

    #[test]
    fn unknown_event_kind_is_preserved() {
        let event = HelioEvent::parse(&payload("REFUNDED", "SUCCESS")).unwrap();
        assert_eq!(
            event.kind,
            HelioEventKind::Unrecognized("REFUNDED".to_string())
        );
        assert_eq!(event.kind.as_str(), "REFUNDED");
    }

    #[test]
    fn optional_fields_take_defaults() {
        let body = json!({
            "event": "CREATED",
            "subscriptionId": "sub_helio_9",
            "transactionObject": {
                "id": "tx_1",
                "paylinkId": "pl_1",
                "meta": { "transactionStatus": "PENDING" }
            }
        })
        .to_string();

        let event = HelioEvent::parse(body.as_bytes()).unwrap();
        assert_eq!(event.amount, Decimal::ZERO);
        assert_eq!(event.currency, "USDC");
        assert_eq!(event.duration, RenewalDuration::Month);
        assert_eq!(event.status, TransactionStatus::Pending);
        assert_eq!(event.subscription_ref.as_deref(), Some("sub_helio_9"));
        assert!(event.metadata.user_id().is_none());
    }

    #[test]
    fn numeric_metadata_and_amount_are_accepted() {
        let body = json!({
            "event": "CREATED",
            "transactionObject": {
                "id": "tx_2",
                "paylinkId": "pl_2",
                "meta": {
                    "transactionStatus": "SUCCESS",
                    "amount": 12.5,
                    "metadata": { "userId": 42, "modelId": "m", "planId": "p" }
                }
            }
        })
        .to_string();

        let event = HelioEvent::parse(body.as_bytes()).unwrap();
        assert_eq!(event.amount, Decimal::new(125, 1));
        assert_eq!(event.metadata.user_id().unwrap().as_str(), "42");
    }

    // ══════════════════════════════════════════════════════════════
    // Malformed Payloads
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn rejects_non_json_body() {
        let err = HelioEvent::parse(b"not json").unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[test]
    fn rejects_missing_transaction_object() {
        let body = json!({ "event": "CREATED" }).to_string();
        let err = HelioEvent::parse(body.as_bytes()).unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[test]
    fn rejects_empty_transaction_id() {
        let body = json!({
            "event": "CREATED",
            "transactionObject": {
                "id": "",
                "paylinkId": "pl",
                "meta": { "transactionStatus": "SUCCESS" }
            }
        })
        .to_string();
        let err = HelioEvent::parse(body.as_bytes()).unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(msg) if msg.contains("transactionObject.id")));
    }

    #[test]
    fn rejects_unknown_duration() {
        let body = json!({
            "event": "CREATED",
            "transactionObject": {
                "id": "tx",
                "paylinkId": "pl",
                "meta": {
                    "transactionStatus": "SUCCESS",
                    "metadata": { "duration": "fortnight" }
                }
            }
        })
        .to_string();
        assert!(matches!(
            HelioEvent::parse(body.as_bytes()),
            Err(WebhookError::MalformedPayload(_))
        ));
    }

    #[test]
    fn rejects_garbage_amount() {
        let body = json!({
            "event": "CREATED",
            "transactionObject": {
                "id": "tx",
                "paylinkId": "pl",
                "meta": { "transactionStatus": "SUCCESS", "amount": "ten" }
            }
        })
        .to_string();
        assert!(matches!(
            HelioEvent::parse(body.as_bytes()),
            Err(WebhookError::MalformedPayload(_))
        ));
    }
}
