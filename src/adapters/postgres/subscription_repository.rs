//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{corrupt_row, db_error, is_unique_violation};
use crate::domain::foundation::{
    DomainError, ErrorCode, ModelId, PlanId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{CreateOutcome, SubscriptionRepository};

/// Partial unique index on `(user_id, model_id) WHERE status = 'active'`.
const ONE_ACTIVE_INDEX: &str = "subscriptions_one_active_per_pair";

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, model_id, plan_id, status, current_period_start,
           current_period_end, external_reference, created_at, updated_at,
           cancelled_at
    FROM subscriptions
"#;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    model_id: String,
    plan_id: String,
    status: String,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    external_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(corrupt_row)?,
            model_id: ModelId::new(row.model_id).map_err(corrupt_row)?,
            plan_id: PlanId::new(row.plan_id).map_err(corrupt_row)?,
            status: row.status.parse::<SubscriptionStatus>().map_err(corrupt_row)?,
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            external_reference: row.external_reference,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
        })
    }
}

fn into_subscriptions(rows: Vec<SubscriptionRow>) -> Result<Vec<Subscription>, DomainError> {
    rows.into_iter().map(Subscription::try_from).collect()
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn create_if_no_active(
        &self,
        subscription: &Subscription,
    ) -> Result<CreateOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, model_id, plan_id, status, current_period_start,
                current_period_end, external_reference, created_at, updated_at,
                cancelled_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(subscription.model_id.as_str())
        .bind(subscription.plan_id.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(&subscription.external_reference)
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.cancelled_at.as_ref().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) if is_unique_violation(&e, ONE_ACTIVE_INDEX) => Ok(CreateOutcome::ActiveExists),
            Err(e) => Err(db_error("Failed to create subscription", e)),
        }
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $2,
                current_period_start = $3,
                current_period_end = $4,
                external_reference = $5,
                updated_at = $6,
                cancelled_at = $7
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(&subscription.external_reference)
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.cancelled_at.as_ref().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Reactivating while another subscription for the pair is active.
            if is_unique_violation(&e, ONE_ACTIVE_INDEX) {
                return DomainError::new(
                    ErrorCode::DuplicateSubscription,
                    "An active subscription already exists for this model",
                );
            }
            db_error("Failed to update subscription", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(
                DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
                    .with_detail("subscription_id", subscription.id.to_string()),
            );
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_active(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND model_id = $2 AND status = 'active'",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(model_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch active subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "{} WHERE external_reference = $1 ORDER BY created_at DESC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch subscription by reference", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_latest_renewable(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
        expired_since: Timestamp,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            r#"{}
            WHERE user_id = $1 AND model_id = $2
              AND (status <> 'expired' OR current_period_end >= $3)
            ORDER BY created_at DESC, current_period_end DESC
            LIMIT 1"#,
            SELECT_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(model_id.as_str())
        .bind(expired_since.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch renewable subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_lapsed(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            r#"{}
            WHERE status <> 'expired' AND current_period_end < $1
            ORDER BY current_period_end ASC
            LIMIT $2"#,
            SELECT_COLUMNS
        ))
        .bind(now.as_datetime())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch lapsed subscriptions", e))?;

        into_subscriptions(rows)
    }
}
