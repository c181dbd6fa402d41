// libs/auth-cell/src/models.rs
use serde::Deserialize;
use thiserror::Error;

use appointment_cell::models::AppointmentError;
use shared_models::error::AppError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

impl RegisterRequest {
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("password", &self.password),
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
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This account has been disabled")]
    AccountDisabled,

    #[error("User not found")]
    NotFound,

    #[error("Account store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(_) | AuthError::WeakPassword(_) => {
                AppError::ValidationError(e.to_string())
            }
            AuthError::EmailTaken => AppError::Conflict(e.to_string()),
            AuthError::InvalidCredentials | AuthError::AccountDisabled => {
                AppError::Auth(e.to_string())
            }
            AuthError::NotFound => AppError::NotFound(e.to_string()),
            AuthError::StoreUnavailable(_) => AppError::ServiceUnavailable(e.to_string()),
            AuthError::Database(msg) | AuthError::Token(msg) => AppError::Internal(msg),
            AuthError::Appointment(inner) => inner.into(),
        }
    }
}
