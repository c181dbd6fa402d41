use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::context::AppContext;
use crate::jwt::validate_token;

/// Middleware for authentication: validates the bearer token and stashes the
/// decoded user in request extensions.
pub async fn auth_middleware(
    State(ctx): State<Arc<AppContext>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    let token = &auth_value[7..];

    let user = validate_token(token, &ctx.config.jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Middleware for unauthenticated state-changing routes: the caller must
/// present a token from `GET /csrf-token` in the `x-csrf-token` header.
pub async fn csrf_middleware(
    State(ctx): State<Arc<AppContext>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("x-csrf-token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Auth("Missing CSRF token".to_string()))?;

    if !ctx.csrf_tokens.validate(token) {
        return Err(AppError::Auth("Invalid or expired CSRF token".to_string()));
    }

    Ok(next.run(request).await)
}

/// Guard used by admin-only handlers.
pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Auth("Access denied. Admin only.".to_string()))
    }
}
