// libs/payment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use shared_models::appointment::normalize_email;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::context::AppContext;

use crate::models::InitializePaymentRequest;
use crate::services::reconciliation::PaymentService;

/// POST /payments/initialize
pub async fn initialize_payment(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
    Json(payload): Json<InitializePaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = PaymentService::new(&ctx);

    // Patients can only pay for their own bookings.
    if !user.is_admin() {
        let id = payload
            .appointment_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AppError::ValidationError("Missing required fields: appointment_id".to_string())
            })?;
        let appointment = service.appointments().get_appointment(id).await?;
        let own_email = user
            .email
            .as_deref()
            .map(normalize_email)
            .unwrap_or_default();
        if appointment.email != own_email {
            return Err(AppError::Auth("Access denied".to_string()));
        }
    }

    let (appointment, session) = service.initialize_checkout(payload).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Payment initialized",
        "data": {
            "appointment_id": appointment.id,
            "authorization_url": session.authorization_url,
            "access_code": session.access_code,
            "reference": session.reference,
        },
    })))
}

/// GET /payments/verify/{reference}
pub async fn verify_payment(
    State(ctx): State<Arc<AppContext>>,
    Extension(_user): Extension<User>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let service = PaymentService::new(&ctx);
    let (appointment, applied) = service.verify_and_reconcile(&reference).await?;

    Ok(Json(json!({
        "success": true,
        "message": if applied {
            "Payment verified and appointment confirmed"
        } else {
            "Payment already recorded"
        },
        "data": appointment,
    })))
}

/// POST /payments/webhook
///
/// Unauthenticated by necessity; authenticity comes from the provider
/// signature over the raw body.
pub async fn paystack_webhook(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get("x-paystack-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing webhook signature".to_string()))?;

    let service = PaymentService::new(&ctx);
    service.handle_webhook(&body, signature).await?;

    Ok(Json(json!({ "success": true })))
}
