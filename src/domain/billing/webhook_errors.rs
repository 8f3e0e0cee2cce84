//! Webhook error types for Helio webhook handling.
//!
//! Status codes drive the sender's redelivery: Helio retries on any non-2xx
//! response, so only failures that may succeed later map to 5xx.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Authorization header missing, malformed, or carrying the wrong token.
    #[error("Invalid signature")]
    InvalidSignature,

    /// No webhook secret is configured on this server.
    #[error("Webhook secret not configured")]
    MissingSecret,

    /// Body could not be decoded or lacks a required field.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Required merchant metadata entry missing from the transaction.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// An active subscription already exists for the user and model.
    #[error("Active subscription already exists")]
    DuplicateSubscription,

    /// A referenced model, plan or subscription does not exist.
    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    /// Another delivery of the same transaction holds the reconciliation
    /// claim. Answered with a non-2xx so Helio delivers again later.
    #[error("Reconciliation already in progress")]
    ReconciliationInProgress,

    /// Storage operation failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl WebhookError {
    /// Returns true if Helio should redeliver this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Persistence(_)
                | WebhookError::MissingSecret
                | WebhookError::ReconciliationInProgress
        )
    }

    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,

            WebhookError::MalformedPayload(_)
            | WebhookError::MissingMetadata(_)
            | WebhookError::DuplicateSubscription => StatusCode::BAD_REQUEST,

            WebhookError::ReferenceNotFound(_) => StatusCode::NOT_FOUND,

            WebhookError::ReconciliationInProgress => StatusCode::CONFLICT,

            WebhookError::MissingSecret | WebhookError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the sender. Server-side failures are
    /// reported generically; their detail only goes to the logs.
    pub fn public_message(&self) -> String {
        match self {
            WebhookError::Persistence(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::DuplicateSubscription => WebhookError::DuplicateSubscription,
            ErrorCode::NotFound
            | ErrorCode::PaymentNotFound
            | ErrorCode::SubscriptionNotFound
            | ErrorCode::ModelNotFound
            | ErrorCode::PlanNotFound => WebhookError::ReferenceNotFound(err.message),
            _ => WebhookError::Persistence(err.to_string()),
        }
    }
}
