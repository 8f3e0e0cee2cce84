use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{CreatorId, DomainError};
use crate::ports::EarningsLedger;

/// Running creator balances.
#[derive(Debug, Default)]
pub struct InMemoryEarningsLedger {
    balances: RwLock<HashMap<CreatorId, Decimal>>,
}

impl InMemoryEarningsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn balance(&self, creator_id: &CreatorId) -> Decimal {
        self.balances
            .read()
            .await
            .get(creator_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[async_trait]
impl EarningsLedger for InMemoryEarningsLedger {
    async fn credit(&self, creator_id: &CreatorId, amount: Decimal) -> Result<(), DomainError> {
        *self
            .balances
            .write()
            .await
            .entry(creator_id.clone())
            .or_insert(Decimal::ZERO) += amount;
        Ok(())
    }
}
