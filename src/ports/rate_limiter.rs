//! Rate limiting port for client request throttling.
//!
//! Counters live behind this port so that limits hold across horizontally
//! scaled instances (shared counter store) while tests and single-instance
//! deployments can use process memory.

use async_trait::async_trait;
use std::fmt;

use crate::domain::foundation::{Timestamp, UserId};

/// Port for fixed-window request counting.
///
/// Implementations must be safe for concurrent use; a check and its
/// increment happen atomically.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts a request against the key's window.
    ///
    /// Returns `Allowed` with remaining quota or `Denied` with retry info.
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError>;

    /// Current window status without counting a request.
    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError>;

    /// Clears the key's window.
    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError>;
}

/// Who is being throttled.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum RateLimitScope {
    /// Anonymous caller identified by network fingerprint.
    Client,
    /// Authenticated user.
    User,
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Client => "client",
            RateLimitScope::User => "user",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key identifying one throttled counter.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub scope: RateLimitScope,
    /// Client fingerprint or user id.
    pub identifier: String,
    /// Optional route group for finer-grained limits (e.g. "webhook").
    pub route: Option<String>,
}

impl RateLimitKey {
    /// Key for an anonymous client fingerprint (usually its IP).
    pub fn client(fingerprint: &str) -> Self {
        Self {
            scope: RateLimitScope::Client,
            identifier: fingerprint.to_string(),
            route: None,
        }
    }

    pub fn user(user_id: &UserId) -> Self {
        Self {
            scope: RateLimitScope::User,
            identifier: user_id.to_string(),
            route: None,
        }
    }

    /// Narrows the key to a route group.
    pub fn for_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Storage key, shared by every backend.
    pub fn storage_key(&self) -> String {
        match &self.route {
            Some(route) => format!(
                "ratelimit:{}:{}:{}",
                self.scope, self.identifier, route
            ),
            None => format!("ratelimit:{}:{}", self.scope, self.identifier),
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed(RateLimitStatus),
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }
}

/// Current window status.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Timestamp,
    pub window_secs: u32,
}

/// Details of a denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    pub limit: u32,
    pub retry_after_secs: u32,
    pub scope: RateLimitScope,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Counter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}
