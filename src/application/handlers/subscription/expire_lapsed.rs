//! ExpireLapsedHandler - periodic sweep that expires subscriptions whose
//! period has ended.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::SubscriptionRepository;

const DEFAULT_BATCH_SIZE: u32 = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpireLapsedResult {
    pub expired: usize,
    pub failed: usize,
}

pub struct ExpireLapsedHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    batch_size: u32,
}

impl ExpireLapsedHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            subscriptions,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Expires one batch of lapsed subscriptions. Individual failures are
    /// logged and counted; only the lookup itself can fail the sweep.
    pub async fn handle(&self, now: Timestamp) -> Result<ExpireLapsedResult, DomainError> {
        let lapsed = self.subscriptions.find_lapsed(now, self.batch_size).await?;
        let mut result = ExpireLapsedResult::default();

        for mut subscription in lapsed {
            let outcome = match subscription.expire(now) {
                Ok(()) => self.subscriptions.update(&subscription).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => result.expired += 1,
                Err(e) => {
                    tracing::warn!(
                        subscription_id = %subscription.id,
                        error = %e,
                        "Failed to expire lapsed subscription"
                    );
                    result.failed += 1;
                }
            }
        }

        if result.expired > 0 || result.failed > 0 {
            tracing::info!(expired = result.expired, failed = result.failed, "Expiry sweep finished");
        }
        Ok(result)
    }
}
