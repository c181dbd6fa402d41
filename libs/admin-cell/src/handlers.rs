// libs/admin-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Extension, Json};
use chrono::Utc;
use serde_json::json;

use appointment_cell::services::booking::AppointmentService;
use appointment_cell::services::store::AppointmentFilter;
use auth_cell::services::account::AccountService;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::context::AppContext;
use shared_utils::extractor::require_admin;

use crate::services::stats::compute_stats;

/// GET /admin/stats (admin only)
pub async fn dashboard_stats(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&user)?;

    let service = AppointmentService::new(&ctx);
    let appointments = service
        .list_appointments(AppointmentFilter::default())
        .await?;
    let accounts = AccountService::new(&ctx).list_accounts().await?;

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let stats = compute_stats(&appointments, accounts.len(), &today);

    Ok(Json(json!({ "success": true, "data": stats })))
}

/// GET /admin/users (admin only): every account, newest first. Password
/// hashes are stripped by the record's serialization.
pub async fn all_users(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&user)?;

    let accounts = AccountService::new(&ctx).list_accounts().await?;

    Ok(Json(json!({
        "success": true,
        "count": accounts.len(),
        "data": accounts,
    })))
}

/// GET /admin/appointments (admin only): the full book, newest first.
pub async fn all_appointments(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&user)?;

    let service = AppointmentService::new(&ctx);
    let appointments = service
        .list_appointments(AppointmentFilter::default())
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "data": appointments,
    })))
}
