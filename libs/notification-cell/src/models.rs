// libs/notification-cell/src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use shared_models::appointment::AppointmentStatus;

/// Status-driven notification triggers. Each maps to exactly one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    Booked,
    Confirmed,
    Cancelled,
    Completed,
}

impl NotificationEvent {
    /// Template selection for a status change. A no-show reuses the
    /// cancellation template; nothing transitions back into `pending`.
    pub fn for_status(status: AppointmentStatus) -> Self {
        match status {
            AppointmentStatus::Confirmed => NotificationEvent::Confirmed,
            AppointmentStatus::Completed => NotificationEvent::Completed,
            AppointmentStatus::Cancelled | AppointmentStatus::NoShow => {
                NotificationEvent::Cancelled
            }
            AppointmentStatus::Pending => NotificationEvent::Booked,
        }
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationEvent::Booked => write!(f, "booked"),
            NotificationEvent::Confirmed => write!(f, "confirmed"),
            NotificationEvent::Cancelled => write!(f, "cancelled"),
            NotificationEvent::Completed => write!(f, "completed"),
        }
    }
}

/// A rendered message, ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// What the caller learns about a dispatch attempt. Delivery failure is never
/// an error; the triggering operation already succeeded.
#[derive(Debug, Clone, Copy)]
pub struct DispatchReceipt {
    pub delivered: bool,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("email transport not configured: {0}")]
    NotConfigured(String),

    #[error("transport error: {0}")]
    Http(String),

    #[error("transport timed out")]
    Timeout,

    #[error("provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    pub to: Option<String>,
}
