//! Axum router configuration for marketplace endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{check_access, handle_helio_webhook, health, renew_subscription, track_usage};
use super::AppState;

/// User-facing routes. All require a session.
///
/// - `POST /subscriptions/:id/renew` - Start a renewal checkout
/// - `POST /usage` - Track a model operation
/// - `GET|POST /models/:model_id/access` - Check model access
pub fn marketplace_router() -> Router<AppState> {
    Router::new()
        .route("/subscriptions/:id/renew", post(renew_subscription))
        .route("/usage", post(track_usage))
        .route("/models/:model_id/access", get(check_access).post(check_access))
}

/// Webhook routes. No session; verified by Bearer token. Kept apart so
/// request throttling does not apply to the payment provider.
///
/// - `POST /helio` - Handle Helio webhooks
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/helio", post(handle_helio_webhook))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
