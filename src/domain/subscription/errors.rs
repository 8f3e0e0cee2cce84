//! Errors for the user-facing subscription and usage operations.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | AuthenticationRequired | 401 |
//! | AccessDenied | 403 |
//! | SubscriptionRequired | 403 |
//! | ValidationFailed | 400 |
//! | NotEligibleForRenewal | 400 |
//! | NotFound | 404 |
//! | ActiveSubscriptionExists | 409 |
//! | RateLimitExceeded | 429 |
//! | TooManyRequests | 429 |
//! | PaymentProvider | 502 |
//! | Infrastructure | 500 |

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// No session.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Session present, but the resource belongs to someone else.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Paid operation attempted without an active subscription.
    #[error("An active subscription is required for model {0}")]
    SubscriptionRequired(String),

    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Subscription is not yet eligible for renewal (expires at {expires_at:?})")]
    NotEligibleForRenewal { expires_at: Timestamp },

    #[error("{0} not found")]
    NotFound(String),

    /// The pair already has a different active subscription.
    #[error("Another active subscription exists for this model")]
    ActiveSubscriptionExists { active_subscription_id: Option<String> },

    /// Monthly request quota used up.
    #[error("Monthly request limit exceeded")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Per-minute request quota used up.
    #[error("Too many requests, slow down")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl SubscriptionError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SubscriptionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        SubscriptionError::NotFound(what.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        SubscriptionError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::AuthenticationRequired => ErrorCode::Unauthorized,
            SubscriptionError::AccessDenied(_) => ErrorCode::Forbidden,
            SubscriptionError::SubscriptionRequired(_) => ErrorCode::SubscriptionRequired,
            SubscriptionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SubscriptionError::NotEligibleForRenewal { .. } => ErrorCode::NotEligibleForRenewal,
            SubscriptionError::NotFound(_) => ErrorCode::NotFound,
            SubscriptionError::ActiveSubscriptionExists { .. } => ErrorCode::DuplicateSubscription,
            SubscriptionError::RateLimitExceeded { .. } => ErrorCode::RateLimitExceeded,
            SubscriptionError::TooManyRequests { .. } => ErrorCode::TooManyRequests,
            SubscriptionError::PaymentProvider(_) => ErrorCode::PaymentProviderError,
            SubscriptionError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SubscriptionError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            SubscriptionError::AccessDenied(_) | SubscriptionError::SubscriptionRequired(_) => {
                StatusCode::FORBIDDEN
            }
            SubscriptionError::ValidationFailed { .. }
            | SubscriptionError::NotEligibleForRenewal { .. } => StatusCode::BAD_REQUEST,
            SubscriptionError::NotFound(_) => StatusCode::NOT_FOUND,
            SubscriptionError::ActiveSubscriptionExists { .. } => StatusCode::CONFLICT,
            SubscriptionError::RateLimitExceeded { .. }
            | SubscriptionError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            SubscriptionError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            SubscriptionError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Seconds the caller should wait, for throttling errors.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            SubscriptionError::RateLimitExceeded { retry_after_secs }
            | SubscriptionError::TooManyRequests { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// Message safe to show callers; internal failures stay generic.
    pub fn public_message(&self) -> String {
        match self {
            SubscriptionError::Infrastructure(_) => "Internal server error".to_string(),
            SubscriptionError::PaymentProvider(_) => {
                "Payment provider unavailable, try again later".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => {
                SubscriptionError::ValidationFailed {
                    field: err
                        .details
                        .get("field")
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                    message: err.message,
                }
            }
            ErrorCode::SubscriptionNotFound => SubscriptionError::NotFound("Subscription".into()),
            ErrorCode::ModelNotFound => SubscriptionError::NotFound("Model".into()),
            ErrorCode::PlanNotFound => SubscriptionError::NotFound("Plan".into()),
            ErrorCode::DuplicateSubscription => SubscriptionError::ActiveSubscriptionExists {
                active_subscription_id: None,
            },
            _ => SubscriptionError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for SubscriptionError {
    fn from(err: ValidationError) -> Self {
        SubscriptionError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}
