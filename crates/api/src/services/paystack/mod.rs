//! Paystack API client.
//!
//! Implements [`PaymentGateway`] over the Paystack REST API:
//!
//! - `POST /transaction/initialize` opens a transaction and returns the hosted
//!   payment page.
//! - `GET /transaction/verify/{reference}` reports the transaction's state.
//!
//! Both calls authenticate with the secret key as a bearer token. Timeouts,
//! connection failures, and 5xx answers map to [`GatewayError::Unavailable`];
//! 4xx answers and `status: false` envelopes map to [`GatewayError::Rejected`].

pub mod types;
pub mod webhook;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use url::Url;

use self::types::{
    Envelope, ErrorBody, InitializeBody, InitializeData, InitializeMetadata, TransactionData,
    metadata_order_id,
};
pub use self::webhook::{SIGNATURE_HEADER, SignatureError, WebhookEvent, WebhookVerifier};
use super::payments::{
    Authorization, GatewayError, PaymentGateway, TransactionRequest, VerifiedTransaction,
};
use crate::config::PaystackConfig;

/// Paystack REST client.
#[derive(Clone)]
pub struct PaystackClient {
    client: reqwest::Client,
    base_url: Url,
    callback_url: Option<String>,
}

impl PaystackClient {
    /// Create a new Paystack client.
    ///
    /// # Errors
    ///
    /// Returns error if the secret key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &PaystackConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!(
            "Bearer {}",
            config.secret_key.expose_secret()
        ))
        .map_err(|e| GatewayError::InvalidResponse(format!("invalid secret key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            callback_url: config.callback_url.clone(),
        })
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidResponse("base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn an HTTP response into the envelope's `data`, classifying failures.
    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Unavailable(format!("{status}: {body}")));
        }

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_default();
            return Err(GatewayError::Rejected(format!("{status}: {message}")));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if !envelope.status {
            return Err(GatewayError::Rejected(envelope.message));
        }

        envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("envelope without data".to_string()))
    }
}

fn transport_error(e: &reqwest::Error) -> GatewayError {
    GatewayError::Unavailable(e.to_string())
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, reference = %request.reference))]
    async fn initialize(&self, request: &TransactionRequest) -> Result<Authorization, GatewayError> {
        let url = self.endpoint(&["transaction", "initialize"])?;
        let body = InitializeBody {
            email: request.email.as_str(),
            amount: request.amount_minor,
            currency: request.currency.code(),
            reference: &request.reference,
            callback_url: self.callback_url.as_deref(),
            metadata: InitializeMetadata {
                order_id: request.order_id.to_string(),
            },
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let data: InitializeData = Self::read_envelope(response).await?;

        Ok(Authorization {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        let url = self.endpoint(&["transaction", "verify", reference])?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let data: TransactionData = Self::read_envelope(response).await?;

        Ok(VerifiedTransaction {
            order_id: metadata_order_id(&data.metadata),
            customer_email: data.customer.and_then(|c| c.email),
            reference: data.reference,
            status: data.status,
            amount_minor: data.amount,
            currency: data.currency,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use wear_with_pride_core::{CurrencyCode, Email, OrderId};

    use super::*;

    const SECRET: &str = "sk_test_9f8e7d6c5b4a39281706f5e4d3c2b1a0";

    fn client(server: &MockServer, timeout: Duration) -> PaystackClient {
        PaystackClient::new(&PaystackConfig {
            secret_key: SecretString::from(SECRET),
            base_url: Url::parse(&server.uri()).unwrap(),
            callback_url: Some("https://shop.example.com/payment/callback".to_string()),
            currency: CurrencyCode::NGN,
            timeout,
        })
        .unwrap()
    }

    fn request() -> TransactionRequest {
        TransactionRequest {
            order_id: OrderId::new(17),
            email: Email::parse("buyer@shop.ng").unwrap(),
            amount_minor: 250_000,
            currency: CurrencyCode::NGN,
            reference: "order_17_1700000000000".to_string(),
        }
    }

    #[tokio::test]
    async fn test_initialize_sends_amount_and_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .and(bearer_token(SECRET))
            .and(body_partial_json(json!({
                "email": "buyer@shop.ng",
                "amount": 250_000,
                "currency": "NGN",
                "reference": "order_17_1700000000000",
                "metadata": {"orderId": "17"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Authorization URL created",
                "data": {
                    "authorization_url": "https://checkout.paystack.com/abc123",
                    "access_code": "abc123",
                    "reference": "order_17_1700000000000"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = client(&server, Duration::from_secs(5))
            .initialize(&request())
            .await
            .unwrap();

        assert_eq!(auth.authorization_url, "https://checkout.paystack.com/abc123");
        assert_eq!(auth.reference, "order_17_1700000000000");
        assert_eq!(auth.access_code.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_verify_parses_transaction() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/order_17_1700000000000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Verification successful",
                "data": {
                    "status": "success",
                    "reference": "order_17_1700000000000",
                    "amount": 250_000,
                    "currency": "NGN",
                    "metadata": {"orderId": "17"},
                    "customer": {"email": "buyer@shop.ng"}
                }
            })))
            .mount(&server)
            .await;

        let txn = client(&server, Duration::from_secs(5))
            .verify("order_17_1700000000000")
            .await
            .unwrap();

        assert!(txn.succeeded());
        assert_eq!(txn.amount_minor, 250_000);
        assert_eq!(txn.order_id, Some(OrderId::new(17)));
        assert_eq!(txn.customer_email.as_deref(), Some("buyer@shop.ng"));
    }

    #[tokio::test]
    async fn test_verify_tolerates_empty_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/ref-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Verification successful",
                "data": {"status": "abandoned", "reference": "ref-1", "amount": 100, "metadata": ""}
            })))
            .mount(&server)
            .await;

        let txn = client(&server, Duration::from_secs(5))
            .verify("ref-1")
            .await
            .unwrap();

        assert!(!txn.succeeded());
        assert_eq!(txn.order_id, None);
    }

    #[tokio::test]
    async fn test_client_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": false,
                "message": "Transaction reference not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .verify("missing")
            .await
            .unwrap_err();

        assert!(
            matches!(err, GatewayError::Rejected(ref m) if m.contains("reference not found")),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_false_envelope_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": false,
                "message": "Invalid key"
            })))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .verify("ref")
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .initialize(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({"status": true, "data": null})),
            )
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_millis(50))
            .verify("slow")
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_reference_is_path_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/a%2Fb"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": false,
                "message": "Transaction reference not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .verify("a/b")
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Rejected(_)));
    }
}
