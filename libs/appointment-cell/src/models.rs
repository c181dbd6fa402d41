// libs/appointment-cell/src/models.rs
use serde::Deserialize;
use thiserror::Error;

use shared_models::appointment::{AppointmentStatus, PaymentStatus};
use shared_models::error::AppError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking-form payload. Fields are optional so validation can report every
/// missing field in one pass rather than failing on the first.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub message: Option<String>,
    pub amount: Option<f64>,
}

impl CreateAppointmentRequest {
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let required = [
            ("patient_name", &self.patient_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("service", &self.service),
            ("date", &self.date),
            ("time", &self.time),
        ];
        for (name, value) in required {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                missing.push(name.to_string());
            }
        }
        missing
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub status: Option<AppointmentStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub email: Option<String>,
    pub status: Option<AppointmentStatus>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Appointment not found")]
    NotFound,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::Validation(_) => AppError::ValidationError(e.to_string()),
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(e.to_string()),
            AppointmentError::StoreUnavailable(_) => AppError::ServiceUnavailable(e.to_string()),
            AppointmentError::Database(msg) => AppError::Internal(msg),
        }
    }
}
