// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use shared_models::appointment::{normalize_email, AppointmentStatus};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::context::AppContext;
use shared_utils::extractor::require_admin;

use crate::models::{AppointmentQueryParams, CreateAppointmentRequest, UpdateAppointmentRequest};
use crate::services::booking::AppointmentService;
use crate::services::store::AppointmentFilter;

fn account_email(user: &User) -> Result<String, AppError> {
    user.email
        .as_deref()
        .map(normalize_email)
        .ok_or_else(|| AppError::Auth("Token has no email claim".to_string()))
}

/// POST /appointments
///
/// Patients always book under their own account email; admins may book on a
/// patient's behalf.
pub async fn create_appointment(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
    Json(mut payload): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !user.is_admin() {
        payload.email = Some(account_email(&user)?);
    }

    let service = AppointmentService::new(&ctx);
    let appointment = service.create_appointment(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Appointment booked successfully",
            "data": appointment,
        })),
    ))
}

/// GET /appointments?email=&status=
pub async fn get_appointments(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut filter = AppointmentFilter {
        email: params.email,
        status: params.status,
        payment_reference: None,
    };
    // Patients only ever see their own bookings.
    if !user.is_admin() {
        filter.email = Some(account_email(&user)?);
    }

    let service = AppointmentService::new(&ctx);
    let appointments = service.list_appointments(filter).await?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "data": appointments,
    })))
}

/// GET /appointments/{id}
pub async fn get_appointment(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let service = AppointmentService::new(&ctx);
    let appointment = service.get_appointment(&id).await?;

    if !user.is_admin() && appointment.email != account_email(&user)? {
        return Err(AppError::Auth("Access denied".to_string()));
    }

    Ok(Json(json!({ "success": true, "data": appointment })))
}

/// PATCH /appointments/{id}
///
/// Admins may set any lifecycle or payment field; a patient may only cancel
/// their own appointment.
pub async fn update_appointment(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.status.is_none() && payload.payment_status.is_none() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let service = AppointmentService::new(&ctx);

    if !user.is_admin() {
        let cancel_only = payload.status == Some(AppointmentStatus::Cancelled)
            && payload.payment_status.is_none()
            && payload.payment_reference.is_none();
        if !cancel_only {
            return Err(AppError::Auth("Access denied. Admin only.".to_string()));
        }
        let current = service.get_appointment(&id).await?;
        if current.email != account_email(&user)? {
            return Err(AppError::Auth("Access denied".to_string()));
        }
    }

    let mut appointment = None;
    if let Some(status) = payload.status {
        appointment = Some(service.set_status(&id, status).await?);
    }
    if let Some(payment_status) = payload.payment_status {
        appointment = Some(
            service
                .update_payment_status(&id, payment_status, payload.payment_reference.clone())
                .await?,
        );
    }

    // At least one branch ran, per the guard above.
    let appointment = appointment.ok_or_else(|| AppError::BadRequest("No fields to update".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment updated successfully",
        "data": appointment,
    })))
}

/// DELETE /appointments/{id} (admin only)
pub async fn delete_appointment(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&user)?;

    let service = AppointmentService::new(&ctx);
    service.delete_appointment(&id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted successfully",
    })))
}
