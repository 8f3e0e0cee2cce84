//! Subscription module - time-bounded access grants to marketplace models.
//!
//! A subscription ties a user to a model under a plan for a paid period.
//! Webhook reconciliation opens, extends and cancels it; the renewal action
//! prices a further period.

mod aggregate;
mod duration;
mod errors;
mod plan;
mod status;

pub use aggregate::Subscription;
pub use duration::RenewalDuration;
pub use errors::SubscriptionError;
pub use plan::{ModelListing, Plan};
pub use status::SubscriptionStatus;
