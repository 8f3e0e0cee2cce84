//! HTTP adapter for the marketplace payment core.
//!
//! - `POST /api/webhooks/helio` - Helio payment webhooks
//! - `POST /api/subscriptions/:id/renew` - Start a renewal checkout
//! - `POST /api/usage` - Track a model operation
//! - `GET|POST /api/models/:model_id/access` - Check model access
//! - `GET /health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;
mod state;

pub use routes::{health_routes, marketplace_router, webhook_routes};
pub use state::{AppState, ReconcilerSettings};
