//! Helio API request and response payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/paylink/create/api-key`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreatePayLinkBody {
    pub name: String,
    /// Decimal price rendered as a string to avoid float rounding.
    pub price: String,
    pub pricing_currency: String,
    pub template: &'static str,
    pub additional_json: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatePayLinkResponse {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Subset of `GET /v1/transactions/{id}` that carries the settled status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TransactionResponse {
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    /// Some API versions report status at the top level.
    #[serde(default)]
    pub transaction_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TransactionMeta {
    #[serde(default)]
    pub transaction_status: Option<String>,
}

impl TransactionResponse {
    pub fn status(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|m| m.transaction_status.as_deref())
            .or(self.transaction_status.as_deref())
    }
}
