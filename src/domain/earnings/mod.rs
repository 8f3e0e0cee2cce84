//! Earnings module - revenue share owed to model creators.

use rust_decimal::Decimal;

/// Share of each metered cost credited to the model's creator. The platform
/// keeps the remainder.
pub fn creator_share_rate() -> Decimal {
    Decimal::new(80, 2)
}

/// Amount to credit the creator for a cost, or `None` when nothing is owed.
pub fn creator_share(cost: Decimal) -> Option<Decimal> {
    if cost <= Decimal::ZERO {
        return None;
    }
    Some(cost * creator_share_rate())
}
