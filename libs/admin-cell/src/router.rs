// libs/admin-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_utils::context::AppContext;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn admin_routes(state: Arc<AppContext>) -> Router {
    let protected_routes = Router::new()
        .route("/stats", get(handlers::dashboard_stats))
        .route("/appointments", get(handlers::all_appointments))
        .route("/users", get(handlers::all_users))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
