//! Usage records - append-only consumption events.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{CostSchedule, UsageOperation};
use crate::domain::foundation::{ModelId, Timestamp, UsageRecordId, UserId};

/// One tracked operation, as reported by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUsage {
    pub user_id: UserId,
    pub model_id: ModelId,
    pub operation: UsageOperation,
    pub tokens_used: u64,
    pub response_time_ms: u64,
    pub success: bool,
    pub error_type: Option<String>,
    pub metadata: serde_json::Value,
}

/// A persisted usage event. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub id: UsageRecordId,
    pub user_id: UserId,
    pub model_id: ModelId,
    pub operation: UsageOperation,
    /// Requests represented by this record; always 1 for tracked calls.
    pub request_count: u32,
    pub tokens_used: u64,
    pub cost: Decimal,
    pub response_time_ms: u64,
    pub success: bool,
    pub error_type: Option<String>,
    pub metadata: serde_json::Value,
    /// UTC day the usage is aggregated under.
    pub usage_date: NaiveDate,
    pub created_at: Timestamp,
}

impl UsageRecord {
    /// Prices a reported operation and stamps it.
    pub fn price(usage: NewUsage, schedule: &CostSchedule, now: Timestamp) -> Self {
        let cost = schedule.cost(usage.operation, usage.tokens_used, usage.response_time_ms);
        Self {
            id: UsageRecordId::new(),
            user_id: usage.user_id,
            model_id: usage.model_id,
            operation: usage.operation,
            request_count: 1,
            tokens_used: usage.tokens_used,
            cost,
            response_time_ms: usage.response_time_ms,
            success: usage.success,
            error_type: usage.error_type,
            metadata: usage.metadata,
            usage_date: now.date(),
            created_at: now,
        }
    }
}
