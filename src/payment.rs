//! Stripe payment intent client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payment provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("payment provider returned no client secret")]
    MissingClientSecret,
}

/// Converts a decimal price into the smallest currency unit.
///
/// Returns `None` for non-finite prices and prices under one cent.
pub fn price_to_cents(price: f64) -> Option<i64> {
    if !price.is_finite() {
        return None;
    }

    let cents = (price * 100.0).round();
    if cents < 1.0 || cents > i64::MAX as f64 {
        return None;
    }

    Some(cents as i64)
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Minimal Stripe REST client.
///
/// The secret key is stored using `SecretString` so it never shows up in
/// request traces.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: SecretString,
    currency: String,
}

impl StripeClient {
    pub fn new(
        secret_key: SecretString,
        base_url: impl Into<String>,
        currency: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PaymentError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key,
            currency: currency.into(),
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Creates a card payment intent for `amount` cents.
    #[instrument(skip(self))]
    pub async fn create_payment_intent(&self, amount: i64) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&[
                ("amount", amount.to_string()),
                ("currency", self.currency.clone()),
                ("payment_method_types[]", "card".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::extract_error(status, response).await);
        }

        let intent: PaymentIntent = response.json().await?;
        debug!("created payment intent {}", intent.id);

        if intent.client_secret.is_none() {
            return Err(PaymentError::MissingClientSecret);
        }

        Ok(intent)
    }

    async fn extract_error(status: StatusCode, response: reqwest::Response) -> PaymentError {
        let message = match response.json::<StripeErrorBody>().await {
            Ok(body) => body.error.message.unwrap_or_else(|| "Unknown error".into()),
            Err(_) => "Unknown error".into(),
        };
        warn!("payment provider returned {}: {}", status, message);

        PaymentError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(mock_server: &MockServer) -> StripeClient {
        StripeClient::new(
            SecretString::new("sk_test_123".to_string()),
            mock_server.uri(),
            "usd",
            Duration::from_secs(5),
        )
        .expect("client should build")
    }

    #[test]
    fn price_conversion_rounds_to_cents() {
        assert_eq!(price_to_cents(10.0), Some(1000));
        assert_eq!(price_to_cents(19.99), Some(1999));
        assert_eq!(price_to_cents(0.01), Some(1));
    }

    #[test]
    fn price_conversion_rejects_sub_cent_prices() {
        assert_eq!(price_to_cents(0.0), None);
        assert_eq!(price_to_cents(0.004), None);
        assert_eq!(price_to_cents(-5.0), None);
        assert_eq!(price_to_cents(f64::NAN), None);
        assert_eq!(price_to_cents(f64::INFINITY), None);
    }

    #[tokio::test]
    async fn test_create_payment_intent_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("Authorization", "Bearer sk_test_123"))
            .and(body_string_contains("amount=1000"))
            .and(body_string_contains("currency=usd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_123",
                "object": "payment_intent",
                "amount": 1000,
                "currency": "usd",
                "client_secret": "pi_123_secret_abc"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let intent = client
            .create_payment_intent(1000)
            .await
            .expect("payment intent should be created");

        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.amount, 1000);
        assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));
    }

    #[tokio::test]
    async fn test_create_payment_intent_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "type": "invalid_request_error",
                    "message": "Amount must be at least $0.50 usd"
                }
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.create_payment_intent(10).await;

        match result {
            Err(PaymentError::Rejected { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Amount must be at least $0.50 usd");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_payment_intent_without_secret() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_456",
                "amount": 500,
                "currency": "usd",
                "client_secret": null
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.create_payment_intent(500).await;

        assert!(matches!(result, Err(PaymentError::MissingClientSecret)));
    }
}
