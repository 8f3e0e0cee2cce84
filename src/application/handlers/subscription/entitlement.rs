use crate::domain::foundation::{DomainError, ModelId, Timestamp, UserId};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

/// The subscription currently granting `user_id` access to `model_id`.
///
/// A cancelled subscription still counts until its period ends.
pub(crate) async fn find_entitled(
    subscriptions: &dyn SubscriptionRepository,
    user_id: &UserId,
    model_id: &ModelId,
    now: Timestamp,
) -> Result<Option<Subscription>, DomainError> {
    if let Some(active) = subscriptions.find_active(user_id, model_id).await? {
        if active.has_access(now) {
            return Ok(Some(active));
        }
    }
    Ok(subscriptions
        .find_latest_renewable(user_id, model_id, now)
        .await?
        .filter(|s| s.has_access(now)))
}
