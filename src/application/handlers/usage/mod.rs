//! Usage handlers - metering, limit checks and creator earnings.

mod distribute_earnings;
mod track_usage;
mod usage_ledger;

pub use distribute_earnings::EarningsDistributor;
pub use track_usage::{TrackUsageCommand, TrackUsageHandler, TrackUsageResult};
pub use usage_ledger::UsageLedger;
