//! Cost of a tracked operation.

use rust_decimal::{Decimal, RoundingStrategy};

use super::UsageOperation;

/// Decimal places costs are rounded to.
const COST_SCALE: u32 = 5;

/// Unit prices for metered operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostSchedule {
    /// Charged per 1000 tokens of inference.
    pub inference_rate_per_1k_tokens: Decimal,
    /// Charged per second of inference response time.
    pub time_rate_per_second: Decimal,
    /// Flat fee per download.
    pub download_fee: Decimal,
}

impl Default for CostSchedule {
    fn default() -> Self {
        Self {
            inference_rate_per_1k_tokens: Decimal::new(1, 3),
            time_rate_per_second: Decimal::new(1, 4),
            download_fee: Decimal::new(1, 2),
        }
    }
}

impl CostSchedule {
    /// Cost of one operation, rounded to 5 decimal places.
    ///
    /// inference = tokens / 1000 × token rate + seconds × time rate;
    /// download = flat fee; view = free.
    pub fn cost(&self, operation: UsageOperation, tokens: u64, response_time_ms: u64) -> Decimal {
        let raw = match operation {
            UsageOperation::Inference => {
                let thousands = Decimal::from(tokens) / Decimal::from(1000);
                let seconds = Decimal::from(response_time_ms) / Decimal::from(1000);
                thousands * self.inference_rate_per_1k_tokens + seconds * self.time_rate_per_second
            }
            UsageOperation::Download => self.download_fee,
            UsageOperation::View => Decimal::ZERO,
        };
        raw.round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }
}
