//! Rate limiting middleware for axum.
//!
//! Every request is counted against the client address; requests carrying a
//! session are also counted against the user, keyed by the matched route so
//! routes can carry their own limits.
//!
//! Rate limit status is returned in standard HTTP headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `X-RateLimit-Reset`: Unix timestamp when the window resets
//! - `Retry-After`: Seconds to wait (only on 429 response)
//!
//! A limiter backend outage fails open: requests proceed and a warning is
//! logged.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::auth::AuthenticatedUser;
use crate::ports::{RateLimitDenied, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter};

/// Rate limiter middleware state.
pub type RateLimiterState = Arc<dyn RateLimiter>;

static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_fingerprint(request.headers(), connect_info.as_ref());
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string());
    let user = AuthenticatedUser::from_headers(request.headers());

    let mut most_specific: Option<RateLimitStatus> = None;

    if let Some(client) = &client {
        match limiter.check(RateLimitKey::client(client)).await {
            Ok(RateLimitResult::Denied(denied)) => return rate_limit_response(&denied),
            Ok(RateLimitResult::Allowed(status)) => most_specific = Some(status),
            Err(e) => tracing::warn!(error = %e, "Rate limiter unavailable for client check"),
        }
    }

    if let Some(user) = &user {
        let mut key = RateLimitKey::user(&user.user_id);
        if let Some(route) = &route {
            key = key.for_route(route.clone());
        }
        match limiter.check(key).await {
            Ok(RateLimitResult::Denied(denied)) => {
                tracing::info!(user_id = %user.user_id, route = ?route, "User rate limit hit");
                return rate_limit_response(&denied);
            }
            Ok(RateLimitResult::Allowed(status)) => most_specific = Some(status),
            Err(e) => tracing::warn!(error = %e, "Rate limiter unavailable for user check"),
        }
    }

    let mut response = next.run(request).await;
    if let Some(status) = most_specific {
        add_rate_limit_headers(
            response.headers_mut(),
            status.limit,
            status.remaining,
            Some(status.reset_at.as_unix_secs()),
        );
    }
    response
}

/// Client address, preferring proxy headers.
///
/// Order of precedence:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
fn client_fingerprint(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return Some(first.to_string());
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return Some(real_ip.to_string());
        }
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}

fn rate_limit_response(denied: &RateLimitDenied) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error_code": "RATE_LIMIT_EXCEEDED",
            "message": denied.message,
            "retry_after_secs": denied.retry_after_secs,
        })),
    )
        .into_response();

    let headers = response.headers_mut();
    add_rate_limit_headers(headers, denied.limit, 0, None);
    headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(denied.retry_after_secs));
    response
}

fn add_rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_at: Option<i64>) {
    headers.insert(X_RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING.clone(), HeaderValue::from(remaining));
    if let Some(reset_at) = reset_at {
        headers.insert(X_RATELIMIT_RESET.clone(), HeaderValue::from(reset_at));
    }
}
