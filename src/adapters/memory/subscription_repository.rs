use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, ModelId, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{CreateOutcome, SubscriptionRepository};

/// Subscriptions in insertion order.
///
/// `create_if_no_active` and `update` check the pair under one write lock,
/// which gives the same guarantee as the partial unique index in Postgres.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts unconditionally. For seeding fixtures.
    pub async fn insert(&self, subscription: Subscription) {
        self.subscriptions.write().await.push(subscription);
    }

    pub async fn all(&self) -> Vec<Subscription> {
        self.subscriptions.read().await.clone()
    }
}

fn latest<'a>(iter: impl Iterator<Item = &'a Subscription>) -> Option<Subscription> {
    iter.max_by_key(|s| (s.created_at, s.current_period_end)).cloned()
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn create_if_no_active(
        &self,
        subscription: &Subscription,
    ) -> Result<CreateOutcome, DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        let active_exists = subscriptions.iter().any(|s| {
            s.is_active() && s.user_id == subscription.user_id && s.model_id == subscription.model_id
        });
        if active_exists {
            return Ok(CreateOutcome::ActiveExists);
        }
        subscriptions.push(subscription.clone());
        Ok(CreateOutcome::Created)
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        if subscription.is_active() {
            let conflict = subscriptions.iter().any(|s| {
                s.id != subscription.id
                    && s.is_active()
                    && s.user_id == subscription.user_id
                    && s.model_id == subscription.model_id
            });
            if conflict {
                return Err(DomainError::new(
                    ErrorCode::DuplicateSubscription,
                    "Another active subscription exists for this user and model",
                )
                .with_detail("subscription_id", subscription.id.to_string()));
            }
        }
        let slot = subscriptions
            .iter_mut()
            .find(|s| s.id == subscription.id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
                    .with_detail("subscription_id", subscription.id.to_string())
            })?;
        *slot = subscription.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .find(|s| &s.id == id)
            .cloned())
    }

    async fn find_active(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
    ) -> Result<Option<Subscription>, DomainError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(latest(subscriptions.iter().filter(|s| {
            s.is_active() && &s.user_id == user_id && &s.model_id == model_id
        })))
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(latest(subscriptions.iter().filter(|s| {
            s.external_reference.as_deref() == Some(reference)
        })))
    }

    async fn find_latest_renewable(
        &self,
        user_id: &UserId,
        model_id: &ModelId,
        expired_since: Timestamp,
    ) -> Result<Option<Subscription>, DomainError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(latest(subscriptions.iter().filter(|s| {
            &s.user_id == user_id
                && &s.model_id == model_id
                && (s.status != SubscriptionStatus::Expired
                    || s.current_period_end >= expired_since)
        })))
    }

    async fn find_lapsed(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<Subscription>, DomainError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions
            .iter()
            .filter(|s| s.status != SubscriptionStatus::Expired && s.current_period_end < now)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PlanId;
    use crate::domain::subscription::RenewalDuration;

    fn sub(user: &str, model: &str, now: Timestamp) -> Subscription {
        Subscription::start(
            UserId::new(user).unwrap(),
            ModelId::new(model).unwrap(),
            PlanId::new("plan").unwrap(),
            RenewalDuration::Month,
            None,
            now,
        )
    }

    #[tokio::test]
    async fn second_active_for_same_pair_is_refused() {
        let repo = InMemorySubscriptionRepository::new();
        let now = Timestamp::now();

        assert_eq!(
            repo.create_if_no_active(&sub("u", "m", now)).await.unwrap(),
            CreateOutcome::Created
        );
        assert_eq!(
            repo.create_if_no_active(&sub("u", "m", now)).await.unwrap(),
            CreateOutcome::ActiveExists
        );
        assert_eq!(
            repo.create_if_no_active(&sub("u", "other", now)).await.unwrap(),
            CreateOutcome::Created
        );
        assert_eq!(repo.all().await.len(), 2);
    }

    #[tokio::test]
    async fn cancelled_subscription_does_not_block_new_one() {
        let repo = InMemorySubscriptionRepository::new();
        let now = Timestamp::now();
        let mut first = sub("u", "m", now);
        first.cancel(now).unwrap();
        repo.insert(first).await;

        assert_eq!(
            repo.create_if_no_active(&sub("u", "m", now)).await.unwrap(),
            CreateOutcome::Created
        );
    }

    #[tokio::test]
    async fn renewable_lookup_skips_long_expired() {
        let repo = InMemorySubscriptionRepository::new();
        let opened = Timestamp::now().minus_days(90);
        let mut old = sub("u", "m", opened);
        old.expire(opened.plus_days(31)).unwrap();
        repo.insert(old.clone()).await;

        let now = Timestamp::now();
        let found = repo
            .find_latest_renewable(&old.user_id, &old.model_id, now.minus_days(30))
            .await
            .unwrap();
        assert!(found.is_none());

        let found = repo
            .find_latest_renewable(&old.user_id, &old.model_id, now.minus_days(70))
            .await
            .unwrap();
        assert_eq!(found.map(|s| s.id), Some(old.id));
    }

    #[tokio::test]
    async fn lapsed_lists_only_unexpired_past_period_end() {
        let repo = InMemorySubscriptionRepository::new();
        let long_ago = Timestamp::now().minus_days(60);
        let lapsed = sub("u1", "m", long_ago);
        let mut already_expired = sub("u2", "m", long_ago);
        already_expired.expire(long_ago.plus_days(31)).unwrap();
        let current = sub("u3", "m", Timestamp::now());
        repo.insert(lapsed.clone()).await;
        repo.insert(already_expired).await;
        repo.insert(current).await;

        let found = repo.find_lapsed(Timestamp::now(), 10).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, lapsed.id);
    }

    #[tokio::test]
    async fn update_unknown_subscription_fails() {
        let repo = InMemorySubscriptionRepository::new();
        let err = repo.update(&sub("u", "m", Timestamp::now())).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }

    #[tokio::test]
    async fn reactivating_beside_another_active_is_refused() {
        let repo = InMemorySubscriptionRepository::new();
        let opened = Timestamp::now().minus_days(40);
        let mut old = sub("u", "m", opened);
        old.expire(opened.plus_days(31)).unwrap();
        repo.insert(old.clone()).await;
        repo.insert(sub("u", "m", Timestamp::now())).await;

        old.renew(RenewalDuration::Month, Timestamp::now()).unwrap();
        let err = repo.update(&old).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DuplicateSubscription);
        let stored = repo.find_by_id(&old.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn updating_the_active_subscription_itself_is_allowed() {
        let repo = InMemorySubscriptionRepository::new();
        let mut current = sub("u", "m", Timestamp::now());
        repo.insert(current.clone()).await;

        current.renew(RenewalDuration::Month, Timestamp::now()).unwrap();
        repo.update(&current).await.unwrap();
    }
}
