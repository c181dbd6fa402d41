// libs/payment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::models::AppointmentError;
use shared_models::error::AppError;

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct InitializePaymentRequest {
    pub appointment_id: Option<String>,
    /// Naira amount; overrides the amount stored on the appointment.
    pub amount: Option<f64>,
}

/// What the frontend needs to send the patient to the checkout page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// The slice of a Paystack transaction we act on.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackTransaction {
    pub status: String,
    pub reference: String,
    /// Kobo, as charged.
    pub amount: i64,
    #[serde(default)]
    pub metadata: TransactionMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionMetadata {
    pub appointment_id: Option<String>,
}

impl PaystackTransaction {
    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payments are not configured")]
    NotConfigured,

    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Webhook signature mismatch")]
    InvalidSignature,

    /// Transient: the provider never answered (timeout, connect failure).
    /// Safe to retry since payment application downstream is idempotent.
    #[error("Payment provider unreachable: {0}")]
    Transport(String),

    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Transaction {0} was not successful")]
    NotSuccessful(String),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::NotConfigured => AppError::ServiceUnavailable(e.to_string()),
            PaymentError::Validation(_) => AppError::ValidationError(e.to_string()),
            PaymentError::InvalidSignature => AppError::BadRequest(e.to_string()),
            PaymentError::Transport(msg) => AppError::Timeout(msg),
            PaymentError::Provider(msg) => AppError::ExternalService(msg),
            PaymentError::NotSuccessful(_) => AppError::BadRequest(e.to_string()),
            PaymentError::Appointment(inner) => inner.into(),
        }
    }
}
