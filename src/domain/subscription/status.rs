//! Subscription status state machine.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a subscription.
///
/// NONE (no row) → ACTIVE → {CANCELLED, EXPIRED, PAST_DUE}. Any non-active
/// state returns to ACTIVE through a paid renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Paid and within period.
    Active,

    /// Renewal stopped. Access continues until period end.
    Cancelled,

    /// Period over. No access.
    Expired,

    /// Renewal charge failed. Access continues until period end.
    PastDue,
}

impl SubscriptionStatus {
    /// Returns true if this status can grant access while the period lasts.
    pub fn grants_access(&self) -> bool {
        !matches!(self, SubscriptionStatus::Expired)
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::PastDue => "past_due",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown subscription status '{}'", other),
            )),
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From ACTIVE
            (Active, Active) // Renewal
                | (Active, Cancelled)
                | (Active, Expired)
                | (Active, PastDue)
            // From CANCELLED
                | (Cancelled, Active)
                | (Cancelled, Expired)
            // From PAST_DUE
                | (PastDue, Active)
                | (PastDue, Cancelled)
                | (PastDue, Expired)
            // From EXPIRED
                | (Expired, Active)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Active => vec![Active, Cancelled, Expired, PastDue],
            Cancelled => vec![Active, Expired],
            PastDue => vec![Active, Cancelled, Expired],
            Expired => vec![Active],
        }
    }
}
