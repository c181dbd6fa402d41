// Account lifecycle against the in-memory stores.
use std::sync::Arc;

use assert_matches::assert_matches;

use appointment_cell::models::CreateAppointmentRequest;
use appointment_cell::services::booking::AppointmentService;
use auth_cell::models::{AuthError, LoginRequest, RegisterRequest};
use auth_cell::services::account::AccountService;
use shared_models::auth::UserStatus;
use shared_utils::context::AppContext;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::TestConfig;

fn test_ctx() -> Arc<AppContext> {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = String::new();
    Arc::new(AppContext::new(config))
}

fn registration(email: &str) -> RegisterRequest {
    RegisterRequest {
        name: Some("Ada Obi".to_string()),
        email: Some(email.to_string()),
        phone: Some("+2348000000000".to_string()),
        password: Some("correct-horse-battery".to_string()),
    }
}

#[tokio::test]
async fn register_issues_a_valid_token_and_hides_the_hash() {
    let ctx = test_ctx();
    let service = AccountService::new(&ctx);

    let (user, token) = service.register(registration(" Ada@X.com ")).await.unwrap();

    assert!(user.id.starts_with("USR_"));
    assert_eq!(user.email, "ada@x.com");
    assert_eq!(user.phone, "+2348000000000");
    assert_eq!(user.role, "user");
    assert_eq!(user.status, UserStatus::Active);
    // stored as a hash, never the raw password
    assert!(user.password.starts_with("$argon2"));

    let decoded = validate_token(&token, &ctx.config.jwt_secret).unwrap();
    assert_eq!(decoded.id, user.id);
    assert_eq!(decoded.email.as_deref(), Some("ada@x.com"));

    // The hash must not survive serialization into an API response.
    let serialized = serde_json::to_value(&user).unwrap();
    assert!(serialized.get("password").is_none());
}

#[tokio::test]
async fn registration_validates_input() {
    let ctx = test_ctx();
    let service = AccountService::new(&ctx);

    let err = service
        .register(RegisterRequest {
            name: Some("Ada".to_string()),
            email: None,
            phone: None,
            password: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::Validation(fields) => {
        assert_eq!(fields, vec!["email".to_string(), "password".to_string()]);
    });

    let err = service
        .register(RegisterRequest {
            name: Some("Ada".to_string()),
            email: Some("ada@x.com".to_string()),
            phone: None,
            password: Some("short".to_string()),
        })
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::WeakPassword(8));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let ctx = test_ctx();
    let service = AccountService::new(&ctx);

    service.register(registration("ada@x.com")).await.unwrap();
    let err = service
        .register(registration("ADA@x.com"))
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::EmailTaken);
}

#[tokio::test]
async fn login_checks_the_password() {
    let ctx = test_ctx();
    let service = AccountService::new(&ctx);
    service.register(registration("ada@x.com")).await.unwrap();

    let (user, token) = service
        .login(LoginRequest {
            email: Some("Ada@X.com".to_string()),
            password: Some("correct-horse-battery".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(user.email, "ada@x.com");
    assert!(validate_token(&token, &ctx.config.jwt_secret).is_ok());

    let err = service
        .login(LoginRequest {
            email: Some("ada@x.com".to_string()),
            password: Some("wrong-password-entirely".to_string()),
        })
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::InvalidCredentials);

    // Unknown accounts fail the same way as bad passwords.
    let err = service
        .login(LoginRequest {
            email: Some("nobody@x.com".to_string()),
            password: Some("correct-horse-battery".to_string()),
        })
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::InvalidCredentials);
}

#[tokio::test]
async fn disabled_accounts_cannot_log_in() {
    let ctx = test_ctx();
    let service = AccountService::new(&ctx);
    let (user, _) = service.register(registration("ada@x.com")).await.unwrap();

    let mut record = ctx.user_cache.get(&user.id).await.unwrap();
    record.status = UserStatus::Disabled;
    ctx.user_cache.insert(record).await;

    let err = service
        .login(LoginRequest {
            email: Some("ada@x.com".to_string()),
            password: Some("correct-horse-battery".to_string()),
        })
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::AccountDisabled);
}

#[tokio::test]
async fn deleting_an_account_cascades_to_its_appointments() {
    let ctx = test_ctx();
    let service = AccountService::new(&ctx);
    let (user, _) = service.register(registration("ada@x.com")).await.unwrap();

    let appointments = AppointmentService::new(&ctx);
    for _ in 0..2 {
        appointments
            .create_appointment(CreateAppointmentRequest {
                patient_name: Some("Ada Obi".to_string()),
                email: Some("ada@x.com".to_string()),
                phone: Some("+2348000000000".to_string()),
                service: Some("General Consultation".to_string()),
                date: Some("2025-12-01".to_string()),
                time: Some("10:00".to_string()),
                message: None,
                amount: None,
            })
            .await
            .unwrap();
    }

    let removed = service.delete_account(&user.id).await.unwrap();
    assert_eq!(removed, 2);
    assert!(ctx.appointment_cache.is_empty().await);
    assert!(ctx.user_cache.is_empty().await);

    assert_matches!(
        service.get_account(&user.id).await.unwrap_err(),
        AuthError::NotFound
    );
}
