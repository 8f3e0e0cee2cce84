//! PostgreSQL implementation of UsageRepository.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::db_error;
use crate::domain::foundation::{DomainError, ModelId, Timestamp, UserId};
use crate::domain::usage::UsageRecord;
use crate::ports::UsageRepository;

/// Append-only `usage_records` table.
///
/// Counts are summed from `request_count` using the
/// `(user_id, model_id, created_at)` index.
pub struct PostgresUsageRepository {
    pool: PgPool,
}

impl PostgresUsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl UsageRepository for PostgresUsageRepository {
    async fn append(&self, record: &UsageRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO usage_records (
                id, user_id, model_id, operation, request_count, tokens_used, cost,
                response_time_ms, success, error_type, metadata, usage_date, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.as_str())
        .bind(record.model_id.as_str())
        .bind(record.operation.as_str())
        .bind(i64::from(record.request_count))
        .bind(to_bigint(record.tokens_used))
        .bind(record.cost)
        .bind(to_bigint(record.response_time_ms))
        .bind(record.success)
        .bind(&record.error_type)
        .bind(Json(&record.metadata))
        .bind(record.usage_date)
        .bind(record.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to append usage record", e))?;

        Ok(())
    }

    async fn count_requests_since(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
        since: Timestamp,
    ) -> Result<u64, DomainError> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(request_count), 0)::BIGINT
            FROM usage_records
            WHERE user_id = $1 AND model_id = $2 AND created_at >= $3
            "#,
        )
        .bind(user_id.as_str())
        .bind(model_id.as_str())
        .bind(since.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count usage", e))?;

        Ok(u64::try_from(total).unwrap_or(0))
    }
}
