//! Usage module - per-user, per-model consumption accounting.
//!
//! Pure pieces of the usage ledger: what an operation costs, what a usage
//! record holds, and how counts compare against plan limits.

mod cost;
mod limits;
mod operation;
mod record;

pub use cost::CostSchedule;
pub use limits::{DimensionUsage, LimitReport, UsageCounts, UsageLimits, NEAR_LIMIT_PERCENT};
pub use operation::UsageOperation;
pub use record::{NewUsage, UsageRecord};
