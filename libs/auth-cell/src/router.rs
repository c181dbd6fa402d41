// libs/auth-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::context::AppContext;
use shared_utils::extractor::{auth_middleware, csrf_middleware};

use crate::handlers;

pub fn auth_routes(state: Arc<AppContext>) -> Router {
    // Register and login carry no bearer token, so they are the forgeable
    // surface; both demand a CSRF token instead.
    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .layer(middleware::from_fn_with_state(state.clone(), csrf_middleware));

    let protected_routes = Router::new()
        .route("/me", get(handlers::me).delete(handlers::delete_me))
        .route("/logout", post(handlers::logout))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
