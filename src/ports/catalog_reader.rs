//! CatalogReader port - read-only access to listed models and their plans.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ModelId, PlanId};
use crate::domain::subscription::{ModelListing, Plan};

#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn find_model(&self, id: &ModelId) -> Result<Option<ModelListing>, DomainError>;

    async fn find_plan(&self, id: &PlanId) -> Result<Option<Plan>, DomainError>;
}
