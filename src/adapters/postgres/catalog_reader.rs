//! PostgreSQL implementation of CatalogReader.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{corrupt_row, db_error};
use crate::domain::foundation::{CreatorId, DomainError, ModelId, PlanId};
use crate::domain::subscription::{ModelListing, Plan};
use crate::ports::CatalogReader;

/// Read-only view over the `models` and `plans` tables.
pub struct PostgresCatalogReader {
    pool: PgPool,
}

impl PostgresCatalogReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ModelRow {
    id: String,
    creator_id: String,
    name: String,
}

impl TryFrom<ModelRow> for ModelListing {
    type Error = DomainError;

    fn try_from(row: ModelRow) -> Result<Self, Self::Error> {
        Ok(ModelListing {
            id: ModelId::new(row.id).map_err(corrupt_row)?,
            creator_id: CreatorId::new(row.creator_id).map_err(corrupt_row)?,
            name: row.name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: String,
    model_id: String,
    name: String,
    base_price: Decimal,
    currency: String,
    requests_per_month: Option<i32>,
    requests_per_minute: Option<i32>,
}

impl TryFrom<PlanRow> for Plan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        Ok(Plan {
            id: PlanId::new(row.id).map_err(corrupt_row)?,
            model_id: ModelId::new(row.model_id).map_err(corrupt_row)?,
            name: row.name,
            base_price: row.base_price,
            currency: row.currency,
            requests_per_month: row.requests_per_month.map(non_negative),
            requests_per_minute: row.requests_per_minute.map(non_negative),
        })
    }
}

/// Negative limits in storage are treated as zero (exhausted).
fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

#[async_trait]
impl CatalogReader for PostgresCatalogReader {
    async fn find_model(&self, id: &ModelId) -> Result<Option<ModelListing>, DomainError> {
        let row: Option<ModelRow> =
            sqlx::query_as("SELECT id, creator_id, name FROM models WHERE id = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch model", e))?;

        row.map(ModelListing::try_from).transpose()
    }

    async fn find_plan(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, model_id, name, base_price, currency,
                   requests_per_month, requests_per_minute
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch plan", e))?;

        row.map(Plan::try_from).transpose()
    }
}
