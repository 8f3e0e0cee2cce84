//! Paid period lengths and renewal pricing.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

/// Length of a paid period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenewalDuration {
    Hour,
    Day,
    Week,
    Month,
}

impl RenewalDuration {
    pub const ALL: [RenewalDuration; 4] = [
        RenewalDuration::Hour,
        RenewalDuration::Day,
        RenewalDuration::Week,
        RenewalDuration::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RenewalDuration::Hour => "hour",
            RenewalDuration::Day => "day",
            RenewalDuration::Week => "week",
            RenewalDuration::Month => "month",
        }
    }

    /// Fraction of the plan's monthly base price charged for this period.
    pub fn price_rate(&self) -> Decimal {
        match self {
            RenewalDuration::Hour => Decimal::new(5, 2),
            RenewalDuration::Day => Decimal::new(10, 2),
            RenewalDuration::Week => Decimal::new(30, 2),
            RenewalDuration::Month => Decimal::ONE,
        }
    }

    /// Minimum charge for this period, in plan currency units.
    pub fn price_floor(&self) -> Decimal {
        match self {
            RenewalDuration::Hour => Decimal::from(5),
            RenewalDuration::Day => Decimal::from(10),
            RenewalDuration::Week => Decimal::from(30),
            RenewalDuration::Month => Decimal::from(100),
        }
    }

    /// Renewal price: `max(floor, base_price × rate)`.
    pub fn renewal_price(&self, base_price: Decimal) -> Decimal {
        (base_price * self.price_rate()).max(self.price_floor())
    }

    /// End of a period of this length starting at `from`.
    ///
    /// Months are calendar months, not 30-day blocks.
    pub fn extend(&self, from: Timestamp) -> Timestamp {
        match self {
            RenewalDuration::Hour => from.plus(Duration::hours(1)),
            RenewalDuration::Day => from.plus(Duration::days(1)),
            RenewalDuration::Week => from.plus(Duration::weeks(1)),
            RenewalDuration::Month => from.plus_months(1),
        }
    }
}

impl fmt::Display for RenewalDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RenewalDuration {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "hourly" => Ok(RenewalDuration::Hour),
            "day" | "daily" => Ok(RenewalDuration::Day),
            "week" | "weekly" => Ok(RenewalDuration::Week),
            "month" | "monthly" => Ok(RenewalDuration::Month),
            other => Err(ValidationError::invalid_format(
                "duration",
                format!("expected hour, day, week or month, got '{}'", other),
            )),
        }
    }
}
