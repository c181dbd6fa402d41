use std::env;
use tracing::warn;

/// Process configuration, loaded once at startup.
///
/// Optional integrations (Paystack, Resend) degrade to a documented test-mode
/// or queue fallback when their secrets are absent; only logging warns.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub jwt_secret: String,
    pub paystack_secret_key: String,
    pub resend_api_key: String,
    pub email_from: String,
    pub frontend_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, appointments will use the in-memory store");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .or_else(|_| env::var("SUPABASE_ANON_KEY"))
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set, using empty value");
                String::new()
            }),
            paystack_secret_key: env::var("PAYSTACK_SECRET_KEY").unwrap_or_else(|_| {
                warn!("PAYSTACK_SECRET_KEY not set, payments run in test mode");
                String::new()
            }),
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_else(|_| {
                warn!("RESEND_API_KEY not set, emails will be queued instead of sent");
                String::new()
            }),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Clinic <no-reply@clinic.example>".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5500".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.is_database_configured() && !self.jwt_secret.is_empty()
    }

    pub fn is_database_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    pub fn is_payments_configured(&self) -> bool {
        !self.paystack_secret_key.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.resend_api_key.is_empty()
    }
}
