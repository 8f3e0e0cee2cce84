//! Redis-backed rate limiter for multi-instance deployments.
//!
//! Fixed-window counters. The increment, first-hit expiry and TTL read run
//! as one Lua script so a counter can never be left without an expiry.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::RateLimitConfig;

const INCREMENT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return {count, redis.call('TTL', KEYS[1])}
"#;

#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    config: RateLimitConfig,
    increment: Script,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, config: RateLimitConfig) -> Self {
        Self {
            conn,
            config,
            increment: Script::new(INCREMENT_SCRIPT),
        }
    }

    fn reset_in(&self, ttl: i64) -> i64 {
        if ttl > 0 {
            ttl
        } else {
            i64::from(self.config.window_secs)
        }
    }
}

fn unavailable(e: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(e.to_string())
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let storage_key = key.storage_key();
        let limit = self.config.limit_for(&key);
        let window_secs = self.config.window_secs;
        let mut conn = self.conn.clone();

        let (count, ttl): (i64, i64) = self
            .increment
            .key(&storage_key)
            .arg(window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        let reset_in = self.reset_in(ttl);
        let count = u32::try_from(count).unwrap_or(u32::MAX);

        if count > limit {
            let retry_after = reset_in.max(1) as u32;
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

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count),
            reset_at: Timestamp::from_unix_secs(Timestamp::now().as_unix_secs() + reset_in),
            window_secs,
        }))
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let storage_key = key.storage_key();
        let limit = self.config.limit_for(&key);
        let mut conn = self.conn.clone();

        let count: Option<i64> = conn.get(&storage_key).await.map_err(unavailable)?;
        let ttl: i64 = conn.ttl(&storage_key).await.map_err(unavailable)?;
        let count = u32::try_from(count.unwrap_or(0)).unwrap_or(u32::MAX);

        Ok(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count),
            reset_at: Timestamp::from_unix_secs(
                Timestamp::now().as_unix_secs() + self.reset_in(ttl),
            ),
            window_secs: self.config.window_secs,
        })
    }

    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key.storage_key())
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
