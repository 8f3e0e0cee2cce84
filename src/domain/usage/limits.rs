//! Plan limits and how current usage compares to them.

use serde::Serialize;

/// A dimension counts as "near" its limit from this share of usage.
pub const NEAR_LIMIT_PERCENT: u64 = 80;

/// Request caps from a plan. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageLimits {
    pub requests_per_month: Option<u32>,
    pub requests_per_minute: Option<u32>,
}

impl UsageLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }
}

/// Requests counted in the current calendar month and trailing minute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCounts {
    pub month: u64,
    pub minute: u64,
}

/// Usage of a single dimension against its limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionUsage {
    pub used: u64,
    pub limit: Option<u32>,
    /// Share of the limit used, `None` when unlimited.
    pub percentage: Option<f64>,
}

impl DimensionUsage {
    fn evaluate(used: u64, limit: Option<u32>) -> Self {
        let percentage = limit.map(|limit| {
            if limit == 0 {
                100.0
            } else {
                let pct = used as f64 / limit as f64 * 100.0;
                (pct * 100.0).round() / 100.0
            }
        });
        Self {
            used,
            limit,
            percentage,
        }
    }

    /// True once usage reaches 80% of the limit. Integer arithmetic so the
    /// boundary is exact.
    pub fn is_near_limit(&self) -> bool {
        match self.limit {
            Some(limit) => self.used * 100 >= u64::from(limit) * NEAR_LIMIT_PERCENT,
            None => false,
        }
    }

    /// True when no further request fits under the limit.
    pub fn is_exhausted(&self) -> bool {
        match self.limit {
            Some(limit) => self.used >= u64::from(limit),
            None => false,
        }
    }
}

/// Result of comparing usage counts with plan limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitReport {
    pub monthly: DimensionUsage,
    pub per_minute: DimensionUsage,
    pub is_near_limit: bool,
}

impl LimitReport {
    pub fn evaluate(counts: UsageCounts, limits: UsageLimits) -> Self {
        let monthly = DimensionUsage::evaluate(counts.month, limits.requests_per_month);
        let per_minute = DimensionUsage::evaluate(counts.minute, limits.requests_per_minute);
        Self {
            is_near_limit: monthly.is_near_limit() || per_minute.is_near_limit(),
            monthly,
            per_minute,
        }
    }

    pub fn monthly_exceeded(&self) -> bool {
        self.monthly.is_exhausted()
    }

    pub fn minute_exceeded(&self) -> bool {
        self.per_minute.is_exhausted()
    }
}
