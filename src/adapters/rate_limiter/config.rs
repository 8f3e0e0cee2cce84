//! Request throttling limits.
//!
//! These protect the HTTP surface from bursts. Plan quotas (monthly and
//! per-minute model requests) are enforced separately by the usage ledger.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ports::{RateLimitKey, RateLimitScope};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests per window per client address.
    pub client_requests_per_window: u32,
    /// Requests per window per authenticated user.
    pub user_requests_per_window: u32,
    /// Per-route overrides for user-scoped keys, by route label.
    pub routes: HashMap<String, u32>,
    /// Fixed window length.
    pub window_secs: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            client_requests_per_window: 120,
            user_requests_per_window: 300,
            routes: HashMap::new(),
            window_secs: 60,
        }
    }
}

impl RateLimitConfig {
    /// Limit that applies to `key`.
    pub fn limit_for(&self, key: &RateLimitKey) -> u32 {
        match key.scope {
            RateLimitScope::Client => self.client_requests_per_window,
            RateLimitScope::User => key
                .route
                .as_deref()
                .and_then(|route| self.routes.get(route).copied())
                .unwrap_or(self.user_requests_per_window),
        }
    }

    pub fn with_route(mut self, route: impl Into<String>, limit: u32) -> Self {
        self.routes.insert(route.into(), limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    #[test]
    fn client_keys_use_client_limit() {
        let config = RateLimitConfig::default();
        assert_eq!(config.limit_for(&RateLimitKey::client("10.0.0.1")), 120);
    }

    #[test]
    fn route_override_applies_to_user_keys_only() {
        let config = RateLimitConfig::default().with_route("usage", 1000);
        let user = UserId::new("u").unwrap();

        assert_eq!(config.limit_for(&RateLimitKey::user(&user).for_route("usage")), 1000);
        assert_eq!(config.limit_for(&RateLimitKey::user(&user).for_route("renew")), 300);
        assert_eq!(config.limit_for(&RateLimitKey::client("ip").for_route("usage")), 120);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: RateLimitConfig = serde_json::from_str(r#"{"window_secs": 10}"#).unwrap();
        assert_eq!(config.window_secs, 10);
        assert_eq!(config.user_requests_per_window, 300);
    }
}
