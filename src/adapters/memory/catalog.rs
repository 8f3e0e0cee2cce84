use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ModelId, PlanId};
use crate::domain::subscription::{ModelListing, Plan};
use crate::ports::CatalogReader;

/// Model and plan listings seeded by the caller.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    models: RwLock<HashMap<ModelId, ModelListing>>,
    plans: RwLock<HashMap<PlanId, Plan>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_model(&self, model: ModelListing) {
        self.models.write().await.insert(model.id.clone(), model);
    }

    pub async fn add_plan(&self, plan: Plan) {
        self.plans.write().await.insert(plan.id.clone(), plan);
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn find_model(&self, id: &ModelId) -> Result<Option<ModelListing>, DomainError> {
        Ok(self.models.read().await.get(id).cloned())
    }

    async fn find_plan(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        Ok(self.plans.read().await.get(id).cloned())
    }
}
