// HTTP surface: auth, ownership, and status codes.
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::router::appointment_routes;
use shared_utils::context::AppContext;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

/// Router backed purely by the in-memory store (no database configured).
fn test_app() -> (Router, Arc<AppContext>) {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = String::new();
    let ctx = Arc::new(AppContext::new(config));
    (appointment_routes(ctx.clone()), ctx)
}

fn bearer(ctx: &AppContext, user: &TestUser) -> String {
    format!(
        "Bearer {}",
        JwtTestUtils::create_test_token(user, &ctx.config.jwt_secret, Some(24))
    )
}

fn booking_body() -> Value {
    json!({
        "patient_name": "Ada Obi",
        "email": "someone-else@x.com",
        "phone": "+2348000000000",
        "service": "General Consultation",
        "date": "2025-12-01",
        "time": "10:00"
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn patients_always_book_under_their_own_email() {
    let (app, ctx) = test_app();
    let patient = TestUser::patient("ada@x.com");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::AUTHORIZATION, bearer(&ctx, &patient))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(booking_body().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["email"], json!("ada@x.com"));
    assert_eq!(body["data"]["status"], json!("pending"));
}

#[tokio::test]
async fn missing_fields_are_a_400_with_the_field_list() {
    let (app, ctx) = test_app();
    let admin = TestUser::admin("admin@x.com");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::AUTHORIZATION, bearer(&ctx, &admin))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "patient_name": "Ada Obi" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("email"));
    assert!(message.contains("time"));
}

#[tokio::test]
async fn patients_only_see_their_own_appointments() {
    let (app, ctx) = test_app();
    let ada = TestUser::patient("ada@x.com");
    let obi = TestUser::patient("obi@x.com");

    for user in [&ada, &obi] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::AUTHORIZATION, bearer(&ctx, user))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(booking_body().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                // The email filter cannot widen a patient's view.
                .uri("/?email=obi@x.com")
                .header(header::AUTHORIZATION, bearer(&ctx, &ada))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["data"][0]["email"], json!("ada@x.com"));
}

#[tokio::test]
async fn patients_may_cancel_but_not_confirm() {
    let (app, ctx) = test_app();
    let ada = TestUser::patient("ada@x.com");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::AUTHORIZATION, bearer(&ctx, &ada))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(booking_body().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{}", id))
                .header(header::AUTHORIZATION, bearer(&ctx, &ada))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "status": "confirmed" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{}", id))
                .header(header::AUTHORIZATION, bearer(&ctx, &ada))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "status": "cancelled" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], json!("cancelled"));
}

#[tokio::test]
async fn invalid_transition_is_a_conflict() {
    let (app, ctx) = test_app();
    let admin = TestUser::admin("admin@x.com");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::AUTHORIZATION, bearer(&ctx, &admin))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(booking_body().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{}", id))
                .header(header::AUTHORIZATION, bearer(&ctx, &admin))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "status": "completed" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn only_admins_delete_and_unknown_ids_are_404() {
    let (app, ctx) = test_app();
    let ada = TestUser::patient("ada@x.com");
    let admin = TestUser::admin("admin@x.com");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/APT_1_missing1")
                .header(header::AUTHORIZATION, bearer(&ctx, &ada))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/APT_1_missing1")
                .header(header::AUTHORIZATION, bearer(&ctx, &admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
