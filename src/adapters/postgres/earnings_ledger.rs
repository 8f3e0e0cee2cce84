//! PostgreSQL implementation of EarningsLedger.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::db_error;
use crate::domain::foundation::{CreatorId, DomainError};
use crate::ports::EarningsLedger;

/// Running totals in `creator_earnings`, incremented in a single upsert so
/// concurrent credits never lose an update.
pub struct PostgresEarningsLedger {
    pool: PgPool,
}

impl PostgresEarningsLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EarningsLedger for PostgresEarningsLedger {
    async fn credit(&self, creator_id: &CreatorId, amount: Decimal) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO creator_earnings (creator_id, total_earnings, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (creator_id) DO UPDATE SET
                total_earnings = creator_earnings.total_earnings + EXCLUDED.total_earnings,
                updated_at = NOW()
            "#,
        )
        .bind(creator_id.as_str())
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to credit creator earnings", e))?;

        Ok(())
    }
}
