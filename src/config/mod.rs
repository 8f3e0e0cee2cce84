//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `MODEL_MARKET` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use model_market::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod payment;
mod redis;
mod server;
mod subscription;
mod usage;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use subscription::SubscriptionConfig;
pub use usage::UsageConfig;

use serde::Deserialize;

use crate::adapters::rate_limiter::RateLimitConfig;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// development configuration on in-memory stores.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Bind address, logging and HTTP timeouts
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Shared rate-limit counters
    #[serde(default)]
    pub redis: RedisConfig,

    /// Helio credentials
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Metered operation prices
    #[serde(default)]
    pub usage: UsageConfig,

    /// Request throttling
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Renewal matching and expiry sweep
    #[serde(default)]
    pub subscription: SubscriptionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `MODEL_MARKET` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `MODEL_MARKET__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `MODEL_MARKET__PAYMENT__HELIO_WEBHOOK_SECRET=...` -> `payment.helio_webhook_secret`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("MODEL_MARKET")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Production additionally requires a database, Helio credentials and an
    /// HTTPS provider URL.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let production = self.is_production();
        self.server.validate()?;
        self.database.validate(production)?;
        self.redis.validate()?;
        self.payment.validate(production)?;
        self.usage.validate()?;
        if self.rate_limit.window_secs == 0 {
            return Err(ValidationError::InvalidRateLimitWindow);
        }
        self.subscription.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
