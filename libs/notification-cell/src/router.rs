// libs/notification-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use shared_utils::context::AppContext;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn email_routes(state: Arc<AppContext>) -> Router {
    let protected_routes = Router::new()
        .route("/test", post(handlers::send_test_email))
        .route("/preview", post(handlers::preview_template))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
