//! In-memory rate limiter implementation for testing and development.
//!
//! Uses a fixed-window counter algorithm with an in-memory HashMap.
//! Not suitable for multi-instance deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::RateLimitConfig;

#[derive(Debug)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    windows: RwLock<HashMap<String, WindowState>>,
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    count: u32,
    /// Unix seconds.
    window_start: i64,
}

impl WindowState {
    fn is_expired(&self, now: i64, window_secs: u32) -> bool {
        now >= self.window_start + i64::from(window_secs)
    }
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    fn reset_at(&self, window_start: i64) -> Timestamp {
        Timestamp::from_unix_secs(window_start + i64::from(self.config.window_secs))
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let limit = self.config.limit_for(&key);
        let window_secs = self.config.window_secs;
        let now = Timestamp::now().as_unix_secs();

        let mut windows = self.windows.write().await;
        let state = windows.entry(key.storage_key()).or_insert(WindowState {
            count: 0,
            window_start: now,
        });

        if state.is_expired(now, window_secs) {
            *state = WindowState {
                count: 0,
                window_start: now,
            };
        }

        if state.count >= limit {
            let retry_after = (state.window_start + i64::from(window_secs) - now).max(1) as u32;
            return Ok(RateLimitResult::Denied(RateLimitDenied {
                limit,
                retry_after_secs: retry_after,
                scope: key.scope,
                message: format!(
                    "Rate limit exceeded for {}. Retry after {} seconds.",
                    key.scope, retry_after
                ),
            }));
        }

        state.count += 1;
        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(state.count),
            reset_at: self.reset_at(state.window_start),
            window_secs,
        }))
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let limit = self.config.limit_for(&key);
        let window_secs = self.config.window_secs;
        let now = Timestamp::now().as_unix_secs();

        let windows = self.windows.read().await;
        let (count, window_start) = match windows.get(&key.storage_key()) {
            Some(state) if !state.is_expired(now, window_secs) => (state.count, state.window_start),
            _ => (0, now),
        };

        Ok(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count),
            reset_at: self.reset_at(window_start),
            window_secs,
        })
    }

    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError> {
        self.windows.write().await.remove(&key.storage_key());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::ports::RateLimitScope;

    fn limiter(client_limit: u32) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitConfig {
            client_requests_per_window: client_limit,
            ..RateLimitConfig::default()
        })
    }

    // ─── Basic Functionality Tests ───────────────────────────────────

    #[tokio::test]
    async fn allows_requests_within_limit() {
        let limiter = limiter(10);
        let key = RateLimitKey::client("192.168.1.1");

        for i in 0..10 {
            let result = limiter.check(key.clone()).await.unwrap();
            assert!(result.is_allowed(), "Request {} should be allowed", i + 1);
        }
    }

    #[tokio::test]
    async fn denies_requests_at_limit() {
        let limiter = limiter(5);
        let key = RateLimitKey::client("192.168.1.1");

        for _ in 0..5 {
            assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        }

        match limiter.check(key.clone()).await.unwrap() {
            RateLimitResult::Denied(denied) => {
                assert_eq!(denied.limit, 5);
                assert!(denied.retry_after_secs > 0);
                assert_eq!(denied.scope, RateLimitScope::Client);
            }
            RateLimitResult::Allowed(_) => panic!("sixth request should be denied"),
        }
    }

    #[tokio::test]
    async fn status_returns_remaining_count() {
        let limiter = limiter(10);
        let key = RateLimitKey::client("10.0.0.1");

        assert_eq!(limiter.status(key.clone()).await.unwrap().remaining, 10);
        for _ in 0..3 {
            limiter.check(key.clone()).await.unwrap();
        }
        assert_eq!(limiter.status(key.clone()).await.unwrap().remaining, 7);
    }

    #[tokio::test]
    async fn reset_clears_counter() {
        let limiter = limiter(2);
        let key = RateLimitKey::client("10.0.0.2");
        for _ in 0..2 {
            limiter.check(key.clone()).await.unwrap();
        }
        assert!(!limiter.check(key.clone()).await.unwrap().is_allowed());

        limiter.reset(key.clone()).await.unwrap();

        assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
    }

    // ─── Key Independence ─────────────────────────────────────────────

    #[tokio::test]
    async fn different_clients_have_independent_limits() {
        let limiter = limiter(1);

        limiter.check(RateLimitKey::client("1.1.1.1")).await.unwrap();
        assert!(!limiter.check(RateLimitKey::client("1.1.1.1")).await.unwrap().is_allowed());
        assert!(limiter.check(RateLimitKey::client("2.2.2.2")).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn user_route_override_is_applied() {
        let limiter =
            InMemoryRateLimiter::new(RateLimitConfig::default().with_route("renew", 1));
        let user = UserId::new("user-1").unwrap();
        let key = RateLimitKey::user(&user).for_route("renew");

        assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        assert!(!limiter.check(key).await.unwrap().is_allowed());
        assert!(limiter
            .check(RateLimitKey::user(&user).for_route("usage"))
            .await
            .unwrap()
            .is_allowed());
    }

    #[tokio::test]
    async fn remaining_decrements_correctly() {
        let limiter = limiter(4);
        let key = RateLimitKey::client("test-ip");

        for expected_remaining in (0..4u32).rev() {
            match limiter.check(key.clone()).await.unwrap() {
                RateLimitResult::Allowed(status) => assert_eq!(status.remaining, expected_remaining),
                RateLimitResult::Denied(_) => panic!("should be allowed"),
            }
        }
    }
}
