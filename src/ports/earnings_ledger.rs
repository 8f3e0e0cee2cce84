//! EarningsLedger port - running creator earnings totals.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::foundation::{CreatorId, DomainError};

#[async_trait]
pub trait EarningsLedger: Send + Sync {
    /// Atomically adds `amount` to the creator's total. Never recomputes.
    async fn credit(&self, creator_id: &CreatorId, amount: Decimal) -> Result<(), DomainError>;
}
