//! SubscriptionRepository port.
//!
//! ## One Active Subscription per (user, model)
//!
//! Two CREATED webhooks for the same new pair can race. Implementations
//! must make `create_if_no_active` a single conditional write backed by a
//! storage-level constraint (e.g. a partial unique index on
//! `(user_id, model_id) WHERE status = 'active'`), never read-then-write.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ModelId, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::Subscription;

/// Result of `create_if_no_active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// An active subscription for the pair already exists; nothing written.
    ActiveExists,
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts an active subscription unless the pair already has one.
    async fn create_if_no_active(
        &self,
        subscription: &Subscription,
    ) -> Result<CreateOutcome, DomainError>;

    /// Persists changes to an existing subscription.
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// The active subscription for a pair, if any.
    async fn find_active(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Most recent subscription carrying a Helio reference.
    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Most recent subscription for a pair that can still be renewed or
    /// cancelled: anything not expired, or expired with a period end at or
    /// after `expired_since`.
    async fn find_latest_renewable(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
        expired_since: Timestamp,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Non-expired subscriptions whose period ended before `now`.
    async fn find_lapsed(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<Subscription>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }
}
