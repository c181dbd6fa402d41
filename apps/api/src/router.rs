use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use admin_cell::router::admin_routes;
use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use notification_cell::router::email_routes;
use payment_cell::router::payment_routes;
use shared_utils::context::AppContext;

async fn health(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "database_configured": ctx.config.is_database_configured(),
        "payments_configured": ctx.config.is_payments_configured(),
        "email_configured": ctx.config.is_email_configured(),
    }))
}

async fn csrf_token(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    let token = ctx.csrf_tokens.issue();
    Json(json!({ "success": true, "csrf_token": token }))
}

pub fn create_router(state: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .route("/health", get(health))
        .route("/csrf-token", get(csrf_token))
        .with_state(state.clone())
        .nest("/auth", auth_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/payments", payment_routes(state.clone()))
        .nest("/admin", admin_routes(state.clone()))
        .nest("/email", email_routes(state))
}
