//! EarningsDistributor - credits model creators their revenue share.
//!
//! Best effort: the usage that produced the revenue is already recorded, so
//! a failed credit is logged and swallowed rather than failing the request.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::earnings::creator_share;
use crate::domain::foundation::ModelId;
use crate::ports::{CatalogReader, EarningsLedger};

pub struct EarningsDistributor {
    catalog: Arc<dyn CatalogReader>,
    ledger: Arc<dyn EarningsLedger>,
}

impl EarningsDistributor {
    pub fn new(catalog: Arc<dyn CatalogReader>, ledger: Arc<dyn EarningsLedger>) -> Self {
        Self { catalog, ledger }
    }

    /// Credits the creator of `model_id` with their share of `cost`.
    ///
    /// Returns the credited amount, or `None` when nothing was owed or the
    /// credit could not be made.
    pub async fn distribute(&self, model_id: &ModelId, cost: Decimal) -> Option<Decimal> {
        let share = creator_share(cost)?;

        let model = match self.catalog.find_model(model_id).await {
            Ok(Some(model)) => model,
            Ok(None) => {
                tracing::warn!(model_id = %model_id, "No model listing, earnings not credited");
                return None;
            }
            Err(e) => {
                tracing::warn!(model_id = %model_id, error = %e, "Model lookup failed, earnings not credited");
                return None;
            }
        };

        if let Err(e) = self.ledger.credit(&model.creator_id, share).await {
            tracing::warn!(
                creator_id = %model.creator_id,
                model_id = %model_id,
                amount = %share,
                error = %e,
                "Failed to credit creator earnings"
            );
            return None;
        }

        tracing::debug!(creator_id = %model.creator_id, amount = %share, "Creator earnings credited");
        Some(share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::*;
    use crate::domain::foundation::{CreatorId, DomainError, ErrorCode};
    use async_trait::async_trait;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementation
    // ════════════════════════════════════════════════════════════════════════════

    struct FailingLedger;

    #[async_trait]
    impl EarningsLedger for FailingLedger {
        async fn credit(&self, _creator_id: &CreatorId, _amount: Decimal) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::DatabaseError, "Simulated write failure"))
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn credits_eighty_percent_to_creator() {
        let fx = Fixture::seeded().await;
        let distributor = EarningsDistributor::new(fx.catalog.clone(), fx.earnings.clone());

        let credited = distributor.distribute(&model(), Decimal::from(10)).await;

        assert_eq!(credited, Some(Decimal::from(8)));
        assert_eq!(fx.earnings.balance(&creator()).await, Decimal::from(8));
    }

    #[tokio::test]
    async fn zero_cost_is_noop() {
        let fx = Fixture::seeded().await;
        let distributor = EarningsDistributor::new(fx.catalog.clone(), fx.earnings.clone());

        assert_eq!(distributor.distribute(&model(), Decimal::ZERO).await, None);
        assert_eq!(fx.earnings.balance(&creator()).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn ledger_failure_is_swallowed() {
        let fx = Fixture::seeded().await;
        let distributor = EarningsDistributor::new(fx.catalog.clone(), Arc::new(FailingLedger));

        assert_eq!(distributor.distribute(&model(), Decimal::from(1)).await, None);
    }

    #[tokio::test]
    async fn unknown_model_is_skipped() {
        let fx = Fixture::seeded().await;
        let distributor = EarningsDistributor::new(fx.catalog.clone(), fx.earnings.clone());
        let ghost = ModelId::new("ghost").unwrap();

        assert_eq!(distributor.distribute(&ghost, Decimal::from(1)).await, None);
    }
}
