//! HTTP handlers for marketplace endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::str::FromStr;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};

use crate::adapters::http::error::{ApiError, WebhookApiError, WebhookResponse};
use crate::adapters::http::extract::ApiJson;
use crate::adapters::http::middleware::AuthenticatedUser;
use crate::application::handlers::billing::HandleHelioWebhookCommand;
use crate::application::handlers::subscription::{CheckAccessQuery, RenewSubscriptionCommand};
use crate::application::handlers::usage::TrackUsageCommand;
use crate::domain::foundation::{ModelId, SubscriptionId};
use crate::domain::subscription::{RenewalDuration, SubscriptionError};
use crate::domain::usage::UsageOperation;

use super::dto::{
    non_negative, AccessResponse, HealthResponse, RenewSubscriptionRequest,
    RenewSubscriptionResponse, TrackUsageRequest, TrackUsageResponse,
};
use super::AppState;

/// POST /api/webhooks/helio - Handle Helio payment webhooks
///
/// The body is passed through untouched; the Bearer token is checked before
/// it is parsed.
pub async fn handle_helio_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let result = state
        .webhook_handler()
        .handle(HandleHelioWebhookCommand {
            payload: body.to_vec(),
            authorization,
        })
        .await?;

    Ok(Json(WebhookResponse {
        success: true,
        payment_id: Some(result.payment_id.to_string()),
        subscription_id: result.subscription_id.map(|id| id.to_string()),
        error: None,
    }))
}

/// POST /api/subscriptions/:id/renew - Start a renewal checkout
pub async fn renew_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(subscription_id): Path<String>,
    ApiJson(request): ApiJson<RenewSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription_id = SubscriptionId::from_str(&subscription_id)
        .map_err(|_| SubscriptionError::not_found("Subscription"))?;
    let duration = RenewalDuration::from_str(&request.duration)?;

    let result = state
        .renew_handler()
        .handle(RenewSubscriptionCommand {
            user_id: user.user_id,
            subscription_id,
            duration,
        })
        .await?;

    Ok(Json(RenewSubscriptionResponse::from(result)))
}

/// POST /api/usage - Track a model operation
pub async fn track_usage(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<TrackUsageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = TrackUsageCommand {
        user_id: user.user_id,
        model_id: ModelId::new(request.model_id)?,
        operation: UsageOperation::from_str(&request.operation)?,
        tokens_used: non_negative(request.tokens_used, "tokensUsed")?,
        response_time_ms: non_negative(request.response_time, "responseTime")?,
        success: request.success,
        error_type: request.error_type.filter(|s| !s.trim().is_empty()),
        metadata: request.metadata.unwrap_or(serde_json::Value::Null),
    };

    let result = state.track_usage_handler().handle(cmd).await?;

    Ok(Json(TrackUsageResponse::from(result)))
}

/// GET|POST /api/models/:model_id/access - Check whether the caller may use a model
pub async fn check_access(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(model_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .check_access_handler()
        .handle(CheckAccessQuery {
            user_id: user.user_id,
            model_id: ModelId::new(model_id)?,
        })
        .await?;

    Ok(Json(AccessResponse::from(result)))
}

/// GET /health - Liveness
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
