use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ModelId, Timestamp, UserId};
use crate::domain::usage::UsageRecord;
use crate::ports::UsageRepository;

/// Append-only usage log.
#[derive(Debug, Default)]
pub struct InMemoryUsageRepository {
    records: RwLock<Vec<UsageRecord>>,
}

impl InMemoryUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<UsageRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl UsageRepository for InMemoryUsageRepository {
    async fn append(&self, record: &UsageRecord) -> Result<(), DomainError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn count_requests_since(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
        since: Timestamp,
    ) -> Result<u64, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| &r.user_id == user_id && &r.model_id == model_id && r.created_at >= since)
            .map(|r| u64::from(r.request_count))
            .sum())
    }
}
