//! PostgreSQL implementation of PaymentRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{corrupt_row, db_error};
use crate::domain::billing::{HelioEventKind, Payment, TransactionStatus};
use crate::domain::foundation::{
    DomainError, ErrorCode, ModelId, PaymentId, PlanId, SubscriptionId, Timestamp, UserId,
};
use crate::ports::{PaymentRepository, SaveResult};

/// Payment ledger keyed by Helio transaction id.
///
/// Idempotency rests on the `payments_external_id_key` unique constraint;
/// inserts use `ON CONFLICT DO NOTHING` and report the affected row count.
/// Reconciliation claims are single conditional UPDATEs, so two deliveries
/// racing for the same row cannot both win.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    external_id: String,
    event_kind: String,
    status: String,
    amount: Decimal,
    currency: String,
    user_id: Option<String>,
    model_id: Option<String>,
    plan_id: Option<String>,
    paylink_id: String,
    blockchain_signature: Option<String>,
    subscription_id: Option<Uuid>,
    reconciled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            external_id: row.external_id,
            event_kind: HelioEventKind::from_wire(&row.event_kind),
            status: TransactionStatus::from_wire(&row.status),
            amount: row.amount,
            currency: row.currency,
            user_id: row.user_id.map(UserId::new).transpose().map_err(corrupt_row)?,
            model_id: row.model_id.map(ModelId::new).transpose().map_err(corrupt_row)?,
            plan_id: row.plan_id.map(PlanId::new).transpose().map_err(corrupt_row)?,
            paylink_id: row.paylink_id,
            blockchain_signature: row.blockchain_signature,
            subscription_id: row.subscription_id.map(SubscriptionId::from_uuid),
            reconciled_at: row.reconciled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(
            r#"
            SELECT id, external_id, event_kind, status, amount, currency, user_id,
                   model_id, plan_id, paylink_id, blockchain_signature,
                   subscription_id, reconciled_at, created_at
            FROM payments
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn insert(&self, payment: &Payment) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO payments (
                id, external_id, event_kind, status, amount, currency, user_id,
                model_id, plan_id, paylink_id, blockchain_signature,
                subscription_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (external_id) DO NOTHING
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(&payment.external_id)
        .bind(payment.event_kind.as_str())
        .bind(payment.status.as_str())
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.user_id.as_ref().map(|id| id.as_str()))
        .bind(payment.model_id.as_ref().map(|id| id.as_str()))
        .bind(payment.plan_id.as_ref().map(|id| id.as_str()))
        .bind(&payment.paylink_id)
        .bind(&payment.blockchain_signature)
        .bind(payment.subscription_id.as_ref().map(|id| *id.as_uuid()))
        .bind(payment.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert payment", e))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn claim_reconciliation(
        &self,
        payment_id: &PaymentId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET reconcile_claimed_at = $2
            WHERE id = $1
              AND reconciled_at IS NULL
              AND (reconcile_claimed_at IS NULL OR reconcile_claimed_at < $3)
            "#,
        )
        .bind(payment_id.as_uuid())
        .bind(now.as_datetime())
        .bind(stale_before.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to claim payment", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_claim(&self, payment_id: &PaymentId) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE payments SET reconcile_claimed_at = NULL WHERE id = $1 AND reconciled_at IS NULL",
        )
        .bind(payment_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to release payment claim", e))?;

        Ok(())
    }

    async fn mark_reconciled(
        &self,
        payment_id: &PaymentId,
        subscription_id: Option<&SubscriptionId>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET subscription_id = COALESCE($2, subscription_id),
                reconciled_at = $3,
                reconcile_claimed_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(payment_id.as_uuid())
        .bind(subscription_id.map(|id| *id.as_uuid()))
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to mark payment reconciled", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::PaymentNotFound, "Payment not found")
                .with_detail("payment_id", payment_id.to_string()));
        }
        Ok(())
    }
}
