//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Helio API base URL must use HTTPS in production")]
    ProviderUrlMustBeHttps,

    #[error("Webhook secret is required in production")]
    WebhookSecretRequired,

    #[error("Usage rate must not be negative: {0}")]
    NegativeRate(&'static str),

    #[error("Rate limit window must be positive")]
    InvalidRateLimitWindow,

    #[error("Invalid subscription setting: {0}")]
    InvalidSubscriptionSetting(&'static str),
}
