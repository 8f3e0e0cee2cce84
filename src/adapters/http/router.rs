//! Top-level router: mounts the marketplace areas and the cross-cutting
//! layers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::marketplace::{health_routes, marketplace_router, webhook_routes, AppState};
use super::middleware::{rate_limit_middleware, USER_ID_HEADER};
use crate::ports::RateLimiter;

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    /// Empty allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Assembles the application router.
///
/// ```text
/// /health                        liveness
/// /api/webhooks/helio            not throttled
/// /api/{subscriptions,usage,models}/...  throttled per client and user
/// ```
pub fn build_router(
    state: AppState,
    limiter: Arc<dyn RateLimiter>,
    settings: &HttpSettings,
) -> Router {
    let throttled = marketplace_router()
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

    let api = Router::new()
        .nest("/webhooks", webhook_routes())
        .merge(throttled);

    Router::new()
        .merge(health_routes())
        .nest("/api", api)
        .with_state(state)
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(cors_layer(&settings.cors_allowed_origins))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(USER_ID_HEADER),
        ]);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}
