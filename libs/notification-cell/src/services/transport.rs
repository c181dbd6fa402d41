// libs/notification-cell/src/services/transport.rs
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::models::{EmailMessage, TransportError};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const RESEND_BASE_URL: &str = "https://api.resend.com";

/// A way to get a rendered message out of the process. The dispatcher does not
/// care which backend is behind it; selection is a configuration concern.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError>;
}

/// Transactional-email API transport (Resend).
pub struct ResendTransport {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendTransport {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(SEND_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: RESEND_BASE_URL.to_string(),
            api_key: config.resend_api_key.clone(),
            from: config.email_from.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        if self.api_key.is_empty() {
            return Err(TransportError::NotConfigured("missing Resend API key".into()));
        }

        debug!("Sending \"{}\" to {}", message.subject, message.to);

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [message.to],
                "subject": message.subject,
                "html": message.html,
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Email sent to {}", message.to);
        Ok(())
    }
}

/// Fallback used when no email provider is configured: messages land in an
/// in-process queue instead of being delivered, so attempts stay observable.
/// Doubles as the recording transport in tests.
#[derive(Default)]
pub struct QueueTransport {
    queued: Mutex<Vec<EmailMessage>>,
}

impl QueueTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queued(&self) -> Vec<EmailMessage> {
        self.queued.lock().expect("email queue lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.queued.lock().expect("email queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EmailTransport for QueueTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        info!("Email queued: \"{}\" -> {}", message.subject, message.to);
        self.queued
            .lock()
            .expect("email queue lock poisoned")
            .push(message.clone());
        Err(TransportError::NotConfigured(
            "no email provider configured; message queued".into(),
        ))
    }
}
