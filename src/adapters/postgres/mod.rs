//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresPaymentRepository` - Payment ledger with `ON CONFLICT` idempotency
//! - `PostgresSubscriptionRepository` - Subscriptions guarded by a partial unique index
//! - `PostgresCatalogReader` - Model and plan lookups
//! - `PostgresUsageRepository` - Append-only usage records
//! - `PostgresEarningsLedger` - Creator earnings upserts
//!
//! Schema lives in `migrations/` and is applied with `sqlx::migrate!`.

mod catalog_reader;
mod earnings_ledger;
mod payment_repository;
mod subscription_repository;
mod usage_repository;

pub use catalog_reader::PostgresCatalogReader;
pub use earnings_ledger::PostgresEarningsLedger;
pub use payment_repository::PostgresPaymentRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use usage_repository::PostgresUsageRepository;

use crate::domain::foundation::{DomainError, ValidationError};

/// Postgres SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Applies pending migrations from `migrations/`.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, err))
}

/// Maps a stored value that fails domain validation.
fn corrupt_row(err: ValidationError) -> DomainError {
    DomainError::database(format!("Invalid stored value: {}", err))
}

fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
