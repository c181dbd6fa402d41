// libs/payment-cell/src/services/paystack.rs
use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha512;
use tracing::debug;

use shared_config::AppConfig;

use crate::models::{CheckoutSession, PaymentError, PaystackTransaction};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

/// Paystack wraps every response in `{ status, message, data }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl PaystackClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: PAYSTACK_BASE_URL.to_string(),
            secret_key: config.paystack_secret_key.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder().timeout(timeout).build().unwrap_or_default();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }

    /// `POST /transaction/initialize`. `amount_kobo` is the Naira amount x100.
    pub async fn initialize(
        &self,
        email: &str,
        amount_kobo: i64,
        reference: &str,
        callback_url: &str,
        appointment_id: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        if !self.is_configured() {
            return Err(PaymentError::NotConfigured);
        }

        debug!("Initializing transaction {} for {}", reference, email);

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&json!({
                "email": email,
                "amount": amount_kobo,
                "reference": reference,
                "callback_url": callback_url,
                "metadata": { "appointment_id": appointment_id },
            }))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::unwrap_envelope(response).await
    }

    /// `GET /transaction/verify/{reference}`.
    pub async fn verify(&self, reference: &str) -> Result<PaystackTransaction, PaymentError> {
        if !self.is_configured() {
            return Err(PaymentError::NotConfigured);
        }

        let response = self
            .client
            .get(format!(
                "{}/transaction/verify/{}",
                self.base_url,
                urlencoding::encode(reference)
            ))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::unwrap_envelope(response).await
    }

    /// Never answering is transient and retry-safe; an answered request that
    /// fails is a definitive provider verdict.
    fn map_send_error(e: reqwest::Error) -> PaymentError {
        if e.is_timeout() || e.is_connect() {
            PaymentError::Transport(e.to_string())
        } else {
            PaymentError::Provider(e.to_string())
        }
    }

    /// Webhook authenticity: HMAC-SHA512 of the raw body under the secret key,
    /// hex-encoded, must equal the `x-paystack-signature` header.
    pub fn verify_signature(&self, raw_body: &[u8], signature: &str) -> Result<(), PaymentError> {
        if !self.is_configured() {
            return Err(PaymentError::NotConfigured);
        }

        let mut mac = Hmac::<Sha512>::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| PaymentError::Provider(e.to_string()))?;
        mac.update(raw_body);
        let expected = hex::encode(mac.finalize().into_bytes());

        if expected == signature {
            Ok(())
        } else {
            Err(PaymentError::InvalidSignature)
        }
    }

    async fn unwrap_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!("{}: {}", status, body)));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        if !envelope.status {
            return Err(PaymentError::Provider(
                envelope
                    .message
                    .unwrap_or_else(|| "request not successful".to_string()),
            ));
        }
        envelope
            .data
            .ok_or_else(|| PaymentError::Provider("response carried no data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::TestConfig;

    fn client_with_secret(secret: &str) -> PaystackClient {
        let mut config = TestConfig::default().to_app_config();
        config.paystack_secret_key = secret.to_string();
        PaystackClient::new(&config)
    }

    #[test]
    fn signature_roundtrip() {
        let client = client_with_secret("sk_test_secret");
        let body = br#"{"event":"charge.success"}"#;

        let mut mac = Hmac::<Sha512>::new_from_slice(b"sk_test_secret").unwrap();
        mac.update(body);
        let good = hex::encode(mac.finalize().into_bytes());

        assert!(client.verify_signature(body, &good).is_ok());
        assert!(matches!(
            client.verify_signature(body, "deadbeef"),
            Err(PaymentError::InvalidSignature)
        ));
        assert!(matches!(
            client.verify_signature(b"tampered body", &good),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn unconfigured_client_refuses() {
        let client = client_with_secret("");
        assert!(matches!(
            client.verify_signature(b"body", "sig"),
            Err(PaymentError::NotConfigured)
        ));
    }
}
