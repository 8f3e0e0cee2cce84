//! Subscription aggregate entity.
//!
//! # Design Decisions
//!
//! - **One active per (user, model)**: enforced by a partial unique index,
//!   not by this type
//! - **Period end never decreases**: renewals extend from the later of the
//!   current period end and now
//! - **Cancellation keeps the period**: access runs until natural expiry

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{RenewalDuration, SubscriptionStatus};
use crate::domain::foundation::{
    DomainError, ErrorCode, ModelId, PlanId, StateMachine, SubscriptionId, Timestamp, UserId,
};

/// How close to expiry a subscription must be before it may be renewed.
pub const RENEWAL_WINDOW_HOURS: i64 = 24;

/// A user's time-bounded access grant to a model.
///
/// # Invariants
///
/// - `current_period_start <= current_period_end`
/// - Status transitions follow the state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub model_id: ModelId,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    /// Helio subscription or transaction reference that opened/renews it.
    pub external_reference: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub cancelled_at: Option<Timestamp>,
}

impl Subscription {
    /// Opens a new active subscription for `[now, now + duration]`.
    pub fn start(
        user_id: UserId,
        model_id: ModelId,
        plan_id: PlanId,
        duration: RenewalDuration,
        external_reference: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            user_id,
            model_id,
            plan_id,
            status: SubscriptionStatus::Active,
            current_period_start: now,
            current_period_end: duration.extend(now),
            external_reference,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// True if the status allows access and the period has not ended.
    pub fn has_access(&self, now: Timestamp) -> bool {
        self.status.grants_access() && now <= self.current_period_end
    }

    pub fn has_lapsed(&self, now: Timestamp) -> bool {
        now > self.current_period_end
    }

    /// Time left in the current period, zero once it has ended.
    pub fn time_remaining(&self, now: Timestamp) -> Duration {
        self.current_period_end
            .duration_since(&now)
            .max(Duration::zero())
    }

    /// Renewable once expired or within the final 24 hours.
    pub fn is_renewable(&self, now: Timestamp) -> bool {
        self.has_lapsed(now)
            || self.current_period_end.duration_since(&now) < Duration::hours(RENEWAL_WINDOW_HOURS)
    }

    /// Extends the period by a paid duration and reactivates.
    ///
    /// The extension starts at the later of the current period end and now,
    /// so a renewal never shortens the period and never overlaps a lapse.
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn renew(&mut self, duration: RenewalDuration, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Active)?;
        if self.has_lapsed(now) {
            self.current_period_start = now;
        }
        let anchor = self.current_period_end.max(now);
        self.current_period_end = duration.extend(anchor);
        self.cancelled_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// Stops renewal. The period end is untouched so access continues
    /// until natural expiry.
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Cancelled)?;
        self.cancelled_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Renewal charge failed.
    pub fn mark_past_due(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::PastDue)?;
        self.updated_at = now;
        Ok(())
    }

    /// Period over; access withdrawn.
    pub fn expire(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Expired)?;
        self.updated_at = now;
        Ok(())
    }

    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition subscription from {:?} to {:?}",
                    self.status, target
                ),
            )
            .with_detail("subscription_id", self.id.to_string())
        })?;
        Ok(())
    }
}
