use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use shared_config::AppConfig;
use shared_models::appointment::{Appointment, AppointmentStatus, PaymentStatus};
use shared_models::auth::User;

use crate::context::AppContext;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            paystack_secret_key: String::new(),
            resend_api_key: String::new(),
            email_from: "Test Clinic <no-reply@test.example>".to_string(),
            frontend_url: "http://localhost:5500".to_string(),
        }
    }

    pub fn to_context(&self) -> Arc<AppContext> {
        Arc::new(AppContext::new(self.to_app_config()))
    }

    /// Context whose Supabase base URL points at a wiremock server.
    pub fn with_supabase(url: &str) -> Arc<AppContext> {
        let mut config = TestConfig::default();
        config.supabase_url = url.to_string();
        config.to_context()
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "user")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: format!("USR_{}_test01", Utc::now().timestamp_millis()),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "user")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// A plausible stored appointment for store/handler tests.
pub fn sample_appointment(id: &str, email: &str) -> Appointment {
    Appointment {
        id: id.to_string(),
        patient_name: "Ada Obi".to_string(),
        email: email.to_string(),
        phone: "+2348000000000".to_string(),
        service: "General Consultation".to_string(),
        date: "2025-12-01".to_string(),
        time: "10:00".to_string(),
        message: String::new(),
        status: AppointmentStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_reference: None,
        amount: Some(5000.0),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
