//! Subscription lifecycle configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// How far back an expired subscription still matches RENEWED/ENDED
    /// events, in days
    pub renewal_lookback_days: i64,

    /// Interval between lapsed-subscription sweeps, in seconds
    pub expiry_sweep_interval_secs: u64,

    /// Maximum subscriptions expired per sweep
    pub expiry_batch_size: u32,
}

impl SubscriptionConfig {
    pub fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.renewal_lookback_days < 0 {
            return Err(ValidationError::InvalidSubscriptionSetting(
                "renewal_lookback_days",
            ));
        }
        if self.expiry_sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidSubscriptionSetting(
                "expiry_sweep_interval_secs",
            ));
        }
        if self.expiry_batch_size == 0 {
            return Err(ValidationError::InvalidSubscriptionSetting("expiry_batch_size"));
        }
        Ok(())
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            renewal_lookback_days: 30,
            expiry_sweep_interval_secs: 300,
            expiry_batch_size: 500,
        }
    }
}
