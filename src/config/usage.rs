//! Usage pricing configuration

use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::usage::CostSchedule;

/// Unit prices for metered operations. Defaults match `CostSchedule`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    pub inference_rate_per_1k_tokens: Decimal,
    pub time_rate_per_second: Decimal,
    pub download_fee: Decimal,
}

impl UsageConfig {
    pub fn cost_schedule(&self) -> CostSchedule {
        CostSchedule {
            inference_rate_per_1k_tokens: self.inference_rate_per_1k_tokens,
            time_rate_per_second: self.time_rate_per_second,
            download_fee: self.download_fee,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let rates = [
            ("inference_rate_per_1k_tokens", self.inference_rate_per_1k_tokens),
            ("time_rate_per_second", self.time_rate_per_second),
            ("download_fee", self.download_fee),
        ];
        for (name, rate) in rates {
            if rate.is_sign_negative() {
                return Err(ValidationError::NegativeRate(name));
            }
        }
        Ok(())
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        let schedule = CostSchedule::default();
        Self {
            inference_rate_per_1k_tokens: schedule.inference_rate_per_1k_tokens,
            time_rate_per_second: schedule.time_rate_per_second,
            download_fee: schedule.download_fee,
        }
    }
}
