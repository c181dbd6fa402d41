// libs/payment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::context::AppContext;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn payment_routes(state: Arc<AppContext>) -> Router {
    let protected_routes = Router::new()
        .route("/initialize", post(handlers::initialize_payment))
        .route("/verify/{reference}", get(handlers::verify_payment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // The provider cannot authenticate; the body signature does.
    let public_routes = Router::new().route("/webhook", post(handlers::paystack_webhook));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .with_state(state)
}
