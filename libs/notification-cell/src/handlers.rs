// libs/notification-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::context::AppContext;
use shared_utils::extractor::require_admin;

use crate::models::{NotificationEvent, TestEmailRequest};
use crate::services::dispatcher::NotificationDispatcher;
use crate::services::templates;

/// Admin smoke test for the configured transport.
#[axum::debug_handler]
pub async fn send_test_email(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
    Json(request): Json<TestEmailRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let to = request
        .to
        .or(user.email.clone())
        .ok_or_else(|| AppError::BadRequest("No recipient address".to_string()))?;

    let now = chrono::Utc::now();
    let appointment = shared_models::appointment::Appointment {
        id: "APT_TEST".to_string(),
        patient_name: "Test Recipient".to_string(),
        email: to,
        phone: String::new(),
        service: "Email delivery test".to_string(),
        date: now.format("%Y-%m-%d").to_string(),
        time: now.format("%H:%M").to_string(),
        message: String::new(),
        status: shared_models::appointment::AppointmentStatus::Pending,
        payment_status: shared_models::appointment::PaymentStatus::Pending,
        payment_reference: None,
        amount: None,
        created_at: now,
        updated_at: now,
    };

    let dispatcher = NotificationDispatcher::from_config(&ctx.config);
    let receipt = dispatcher
        .dispatch(&appointment, NotificationEvent::Booked)
        .await;

    Ok(Json(json!({
        "success": true,
        "delivered": receipt.delivered,
        "message": if receipt.delivered { "Email sent" } else { "Email queued" },
    })))
}

/// Preview a rendered template without sending anything.
#[axum::debug_handler]
pub async fn preview_template(
    State(_ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
    Json(appointment): Json<shared_models::appointment::Appointment>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let event = NotificationEvent::for_status(appointment.status);
    let message = templates::render(&appointment, event);

    Ok(Json(json!({
        "success": true,
        "data": {
            "event": event.to_string(),
            "to": message.to,
            "subject": message.subject,
            "html": message.html,
        }
    })))
}
