//! JSON body extraction with API-shaped rejections.
//!
//! axum's `Json` answers malformed bodies with plain-text 400/415/422
//! responses. `ApiJson` runs the same extraction but turns every rejection
//! into a 400 `VALIDATION_FAILED` `ErrorResponse`, naming the offending field
//! when serde reports one.

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::adapters::http::error::ApiError;
use crate::domain::subscription::SubscriptionError;

/// Field reported when the failure is not tied to one field.
const BODY_FIELD: &str = "body";

/// JSON request body.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    let text = rejection.body_text();
    tracing::debug!(status = %rejection.status(), error = %text, "Rejected JSON body");

    let detail = text
        .split_once("target type: ")
        .map(|(_, rest)| rest)
        .unwrap_or(&text);
    let field = rejected_field(detail).unwrap_or_else(|| BODY_FIELD.to_string());

    ApiError(SubscriptionError::validation(field, detail.to_string()))
}

/// Pulls a field name out of a serde error message.
///
/// Recognises ``missing field `x` `` / ``unknown field `x` `` and the
/// `path: message` prefix axum adds for type errors at a known path.
fn rejected_field(detail: &str) -> Option<String> {
    for marker in ["missing field `", "unknown field `"] {
        if let Some(start) = detail.find(marker) {
            let rest = &detail[start + marker.len()..];
            return rest.split('`').next().map(str::to_string);
        }
    }

    let (path, _) = detail.split_once(": ")?;
    let is_path = !path.is_empty()
        && path != "."
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then(|| path.to_string())
}
