//! Error bodies and status mapping for the HTTP surface.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::billing::WebhookError;
use crate::domain::foundation::{DomainError, ValidationError};
use crate::domain::subscription::SubscriptionError;

/// Error body for user-facing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error type that converts application errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub SubscriptionError);

impl From<SubscriptionError> for ApiError {
    fn from(err: SubscriptionError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(SubscriptionError::from(err))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(SubscriptionError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let mut body = ErrorResponse::new(self.0.code().to_string(), self.0.public_message());
        match &self.0 {
            SubscriptionError::ValidationFailed { field, .. } => {
                body = body.with_details(serde_json::json!({ "field": field }));
            }
            SubscriptionError::NotEligibleForRenewal { expires_at } => {
                body = body.with_details(serde_json::json!({ "expiresAt": expires_at }));
            }
            SubscriptionError::ActiveSubscriptionExists {
                active_subscription_id: Some(id),
            } => {
                body = body.with_details(serde_json::json!({ "activeSubscriptionId": id }));
            }
            _ => {}
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.0.retry_after_secs() {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Body returned to the webhook sender.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Webhook failures answer with `{success: false, error}` so Helio can log
/// them. 5xx responses make Helio redeliver.
#[derive(Debug)]
pub struct WebhookApiError(pub WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status: StatusCode = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, retryable = self.0.is_retryable(), "Helio webhook failed");
        } else {
            tracing::warn!(error = %self.0, "Helio webhook rejected");
        }

        let body = WebhookResponse {
            success: false,
            payment_id: None,
            subscription_id: None,
            error: Some(self.0.public_message()),
        };
        (status, Json(body)).into_response()
    }
}
