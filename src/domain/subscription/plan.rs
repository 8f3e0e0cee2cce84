//! Read-only catalog entries owned by the listing service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CreatorId, ModelId, PlanId};
use crate::domain::usage::UsageLimits;

/// A model listed on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelListing {
    pub id: ModelId,
    pub creator_id: CreatorId,
    pub name: String,
}

/// A pricing plan offered for a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub model_id: ModelId,
    pub name: String,
    /// Monthly list price; shorter periods are priced as a fraction of it.
    pub base_price: Decimal,
    pub currency: String,
    /// `None` means unlimited.
    pub requests_per_month: Option<u32>,
    /// `None` means unlimited.
    pub requests_per_minute: Option<u32>,
}

impl Plan {
    pub fn limits(&self) -> UsageLimits {
        UsageLimits {
            requests_per_month: self.requests_per_month,
            requests_per_minute: self.requests_per_minute,
        }
    }

    pub fn belongs_to(&self, model_id: &ModelId) -> bool {
        &self.model_id == model_id
    }
}
