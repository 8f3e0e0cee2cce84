//! UsageRepository port - append-only usage records.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ModelId, Timestamp, UserId};
use crate::domain::usage::UsageRecord;

#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Appends one record. Records are never updated.
    async fn append(&self, record: &UsageRecord) -> Result<(), DomainError>;

    /// Sum of request counts for the pair created at or after `since`.
    async fn count_requests_since(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
        since: Timestamp,
    ) -> Result<u64, DomainError>;
}
