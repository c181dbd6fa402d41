// libs/auth-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::json;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::context::AppContext;

use crate::models::{LoginRequest, RegisterRequest};
use crate::services::account::AccountService;

/// POST /auth/register
pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = AccountService::new(&ctx);
    let (user, token) = service.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Account created",
            "data": { "user": user, "token": token },
        })),
    ))
}

/// POST /auth/login
pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = AccountService::new(&ctx);
    let (user, token) = service.login(payload).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Logged in",
        "data": { "user": user, "token": token },
    })))
}

/// POST /auth/logout. Tokens are stateless, so there is nothing to revoke
/// server-side; the client drops its copy and this acknowledges it.
pub async fn logout(Extension(user): Extension<User>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(json!({
        "success": true,
        "message": "Logged out",
        "user_id": user.id,
    })))
}

/// GET /auth/me
pub async fn me(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    let service = AccountService::new(&ctx);
    let account = service.get_account(&user.id).await?;

    Ok(Json(json!({ "success": true, "data": account })))
}

/// DELETE /auth/me: the account and every appointment booked under it.
pub async fn delete_me(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    let service = AccountService::new(&ctx);
    let removed = service.delete_account(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Account deleted",
        "appointments_removed": removed,
    })))
}
