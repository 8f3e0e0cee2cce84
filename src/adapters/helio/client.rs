//! Helio REST client.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::types::{CreatePayLinkBody, CreatePayLinkResponse, TransactionResponse};
use crate::domain::billing::TransactionStatus;
use crate::ports::{
    PayLink, PayLinkRequest, PaymentProvider, PaymentProviderError, ProviderTransactionStatus,
};

const DEFAULT_API_BASE_URL: &str = "https://api.hel.io";
const DEFAULT_CHECKOUT_BASE_URL: &str = "https://app.hel.io";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Helio API configuration.
#[derive(Clone)]
pub struct HelioConfig {
    api_key: SecretString,
    api_base_url: String,
    /// Host serving hosted checkout pages, used when the API omits a URL.
    checkout_base_url: String,
    timeout: Duration,
}

impl HelioConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            checkout_base_url: DEFAULT_CHECKOUT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_checkout_base_url(mut self, url: impl Into<String>) -> Self {
        self.checkout_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Per-request timeout applied to every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `PaymentProvider` backed by the Helio API.
pub struct HelioClient {
    config: HelioConfig,
    http_client: reqwest::Client,
}

impl HelioClient {
    pub fn new(config: HelioConfig) -> Result<Self, PaymentProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentProviderError::Network(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn checkout_url(&self, pay_link_id: &str) -> String {
        format!("{}/pay/{}", self.config.checkout_base_url, pay_link_id)
    }
}

fn transport_error(err: reqwest::Error) -> PaymentProviderError {
    if err.is_timeout() {
        PaymentProviderError::Timeout
    } else {
        PaymentProviderError::Network(err.to_string())
    }
}

async fn api_error(response: reqwest::Response) -> PaymentProviderError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    PaymentProviderError::Api { status, message }
}

fn map_status(raw: Option<&str>) -> ProviderTransactionStatus {
    match raw.map(TransactionStatus::from_wire) {
        Some(TransactionStatus::Success) => ProviderTransactionStatus::Success,
        Some(TransactionStatus::Pending) => ProviderTransactionStatus::Pending,
        Some(TransactionStatus::Failed) => ProviderTransactionStatus::Failed,
        Some(TransactionStatus::Other(_)) | None => ProviderTransactionStatus::Unknown,
    }
}

#[async_trait]
impl PaymentProvider for HelioClient {
    async fn create_pay_link(&self, request: PayLinkRequest) -> Result<PayLink, PaymentProviderError> {
        let url = format!("{}/v1/paylink/create/api-key", self.config.api_base_url);
        let body = CreatePayLinkBody {
            name: request.name.clone(),
            price: request.price.normalize().to_string(),
            pricing_currency: request.currency.clone(),
            template: "OTHER",
            additional_json: request.metadata(),
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err = api_error(response).await;
            tracing::error!(error = %err, model_id = %request.model_id, "Helio pay-link creation failed");
            return Err(err);
        }

        let created: CreatePayLinkResponse = response
            .json()
            .await
            .map_err(|e| PaymentProviderError::InvalidResponse(e.to_string()))?;

        let url = created
            .url
            .unwrap_or_else(|| self.checkout_url(&created.id));

        tracing::info!(
            pay_link_id = %created.id,
            model_id = %request.model_id,
            price = %request.price,
            "Helio pay-link created"
        );

        Ok(PayLink {
            id: created.id,
            url,
        })
    }

    async fn transaction_status(
        &self,
        transaction_id: &str,
    ) -> Result<ProviderTransactionStatus, PaymentProviderError> {
        let url = format!(
            "{}/v1/transactions/{}",
            self.config.api_base_url, transaction_id
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: TransactionResponse = response
            .json()
            .await
            .map_err(|e| PaymentProviderError::InvalidResponse(e.to_string()))?;

        Ok(map_status(body.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ModelId, PlanId, UserId};
    use crate::domain::subscription::RenewalDuration;
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HelioClient {
        HelioClient::new(
            HelioConfig::new(SecretString::new("helio_key".to_string()))
                .with_base_url(server.uri())
                .with_checkout_base_url("https://checkout.test/")
                .with_timeout(Duration::from_millis(500)),
        )
        .unwrap()
    }

    fn pay_link_request() -> PayLinkRequest {
        PayLinkRequest {
            name: "Model renewal".to_string(),
            price: Decimal::new(1500, 2),
            currency: "USDC".to_string(),
            user_id: UserId::new("user-1").unwrap(),
            model_id: ModelId::new("model-1").unwrap(),
            plan_id: PlanId::new("plan-1").unwrap(),
            duration: RenewalDuration::Week,
            subscription_id: None,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Pay-link creation
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn create_pay_link_builds_checkout_url_from_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/paylink/create/api-key"))
            .and(bearer_token("helio_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "pl_42" })))
            .expect(1)
            .mount(&server)
            .await;

        let link = client(&server).create_pay_link(pay_link_request()).await.unwrap();

        assert_eq!(link.id, "pl_42");
        assert_eq!(link.url, "https://checkout.test/pay/pl_42");
    }

    #[tokio::test]
    async fn create_pay_link_sends_price_as_string_with_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/paylink/create/api-key"))
            .and(wiremock::matchers::body_partial_json(json!({
                "price": "15",
                "pricingCurrency": "USDC",
                "additionalJson": { "userId": "user-1", "duration": "week" }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "pl_1", "url": "https://pay.example/pl_1" })),
            )
            .mount(&server)
            .await;

        let link = client(&server).create_pay_link(pay_link_request()).await.unwrap();

        assert_eq!(link.url, "https://pay.example/pl_1");
    }

    #[tokio::test]
    async fn create_pay_link_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(&server).create_pay_link(pay_link_request()).await.unwrap_err();

        assert!(matches!(err, PaymentProviderError::Api { status: 503, .. }));
        assert!(err.is_retryable());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Transaction status
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn transaction_status_maps_settled_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/transactions/tx-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "meta": { "transactionStatus": "SUCCESS" } })),
            )
            .mount(&server)
            .await;

        let status = client(&server).transaction_status("tx-1").await.unwrap();

        assert_eq!(status, ProviderTransactionStatus::Success);
    }

    #[tokio::test]
    async fn transaction_status_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({})),
            )
            .mount(&server)
            .await;

        let err = client(&server).transaction_status("tx-1").await.unwrap_err();

        assert!(matches!(err, PaymentProviderError::Timeout));
    }

    #[test]
    fn unrecognised_status_is_unknown() {
        assert_eq!(map_status(Some("REVIEW")), ProviderTransactionStatus::Unknown);
        assert_eq!(map_status(None), ProviderTransactionStatus::Unknown);
        assert_eq!(map_status(Some("processing")), ProviderTransactionStatus::Pending);
    }
}
