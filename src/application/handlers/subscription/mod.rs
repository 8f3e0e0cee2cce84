//! Subscription handlers - renewal checkout, access checks, expiry sweep.

mod check_access;
mod entitlement;
mod expire_lapsed;
mod renew_subscription;

pub use check_access::{CheckAccessHandler, CheckAccessQuery, CheckAccessResult};
pub use expire_lapsed::{ExpireLapsedHandler, ExpireLapsedResult};
pub use renew_subscription::{
    RenewSubscriptionCommand, RenewSubscriptionHandler, RenewSubscriptionResult,
};

pub(crate) use entitlement::find_entitled;
