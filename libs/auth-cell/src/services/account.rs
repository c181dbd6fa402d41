// libs/auth-cell/src/services/account.rs
use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use appointment_cell::services::booking::AppointmentService;
use shared_database::supabase::{DbError, SupabaseClient};
use shared_database::users::UserCache;
use shared_models::appointment::normalize_email;
use shared_models::auth::{UserRecord, UserStatus};
use shared_utils::context::AppContext;
use shared_utils::ids::generate_id;
use shared_utils::jwt::issue_token;

use crate::models::{AuthError, LoginRequest, RegisterRequest};

const TABLE: &str = "users";
const MIN_PASSWORD_LEN: usize = 8;
/// Seven days, matching the frontend's session expectations.
const TOKEN_TTL_HOURS: i64 = 168;

/// Account persistence contract; mirrors the appointment store split between
/// Supabase and the in-memory fallback.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: UserRecord) -> Result<UserRecord, AuthError>;
    async fn get_by_id(&self, id: &str) -> Result<UserRecord, AuthError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError>;
    async fn list(&self) -> Result<Vec<UserRecord>, AuthError>;
    async fn delete(&self, id: &str) -> Result<(), AuthError>;
}

fn map_db_error(e: DbError) -> AuthError {
    match e {
        DbError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
        DbError::NotFound(_) => AuthError::NotFound,
        other => AuthError::Database(other.to_string()),
    }
}

pub struct SupabaseUserStore {
    client: Arc<SupabaseClient>,
}

impl SupabaseUserStore {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserStore for SupabaseUserStore {
    async fn create(&self, user: UserRecord) -> Result<UserRecord, AuthError> {
        // Built by hand: serializing a UserRecord drops the password hash,
        // which the stored row must keep.
        let row = json!({
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "phone": user.phone,
            "password": user.password,
            "role": user.role,
            "status": user.status,
            "created_at": user.created_at,
        });
        self.client.insert(TABLE, row).await.map_err(map_db_error)
    }

    async fn get_by_id(&self, id: &str) -> Result<UserRecord, AuthError> {
        let query = format!("select=*&id=eq.{}", urlencoding::encode(id));
        let mut rows: Vec<UserRecord> = self
            .client
            .select(TABLE, &query)
            .await
            .map_err(map_db_error)?;
        rows.pop().ok_or(AuthError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let query = format!("select=*&email=eq.{}", urlencoding::encode(email));
        let mut rows: Vec<UserRecord> = self
            .client
            .select(TABLE, &query)
            .await
            .map_err(map_db_error)?;
        Ok(rows.pop())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, AuthError> {
        self.client
            .select(TABLE, "select=*&order=created_at.desc")
            .await
            .map_err(map_db_error)
    }

    async fn delete(&self, id: &str) -> Result<(), AuthError> {
        let query = format!("id=eq.{}", urlencoding::encode(id));
        let removed = self
            .client
            .delete(TABLE, &query)
            .await
            .map_err(map_db_error)?;
        if removed.is_empty() {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }
}

pub struct MemoryUserStore {
    cache: Arc<UserCache>,
}

impl MemoryUserStore {
    pub fn new(cache: Arc<UserCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: UserRecord) -> Result<UserRecord, AuthError> {
        self.cache.insert(user.clone()).await;
        Ok(user)
    }

    async fn get_by_id(&self, id: &str) -> Result<UserRecord, AuthError> {
        self.cache.get(id).await.ok_or(AuthError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.cache.get_by_email(email).await)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, AuthError> {
        Ok(self.cache.list().await)
    }

    async fn delete(&self, id: &str) -> Result<(), AuthError> {
        if self.cache.remove(id).await {
            Ok(())
        } else {
            Err(AuthError::NotFound)
        }
    }
}

/// Registration, login, and account deletion with its appointment cascade.
pub struct AccountService {
    store: Arc<dyn UserStore>,
    fallback: MemoryUserStore,
    appointments: AppointmentService,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(ctx: &AppContext) -> Self {
        let cache = Arc::clone(&ctx.user_cache);
        let store: Arc<dyn UserStore> = if ctx.config.is_database_configured() {
            Arc::new(SupabaseUserStore::new(Arc::new(SupabaseClient::new(&ctx.config))))
        } else {
            Arc::new(MemoryUserStore::new(Arc::clone(&cache)))
        };

        Self {
            store,
            fallback: MemoryUserStore::new(cache),
            appointments: AppointmentService::new(ctx),
            jwt_secret: ctx.config.jwt_secret.clone(),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<(UserRecord, String), AuthError> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(AuthError::Validation(missing));
        }

        let password = request.password.unwrap_or_default();
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
        }

        let email = normalize_email(&request.email.unwrap_or_default());
        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Database(e.to_string()))?
            .to_string();

        let user = UserRecord {
            id: generate_id("USR", 8),
            name: request.name.unwrap_or_default().trim().to_string(),
            email,
            phone: request.phone.unwrap_or_default().trim().to_string(),
            password: hash,
            role: "user".to_string(),
            status: UserStatus::Active,
            created_at: Utc::now(),
        };

        let saved = match self.store.create(user.clone()).await {
            Ok(saved) => saved,
            Err(AuthError::StoreUnavailable(msg)) => {
                warn!(
                    "Store unreachable ({}), keeping account {} in the fallback cache",
                    msg, user.id
                );
                self.fallback.create(user).await?
            }
            Err(e) => return Err(e),
        };

        info!("Account {} registered", saved.id);
        let token = self.issue(&saved)?;
        Ok((saved, token))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<(UserRecord, String), AuthError> {
        let email = normalize_email(request.email.as_deref().unwrap_or_default());
        let password = request.password.unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let parsed =
            PasswordHash::new(&user.password).map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;

        // Checked after the password so the response does not reveal account
        // state to a caller who never held the credentials.
        if user.status == UserStatus::Disabled {
            return Err(AuthError::AccountDisabled);
        }

        let token = self.issue(&user)?;
        Ok((user, token))
    }

    pub async fn get_account(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        match self.store.get_by_id(user_id).await {
            Ok(user) => Ok(user),
            Err(AuthError::NotFound) => self.fallback.get_by_id(user_id).await,
            Err(AuthError::StoreUnavailable(msg)) => self
                .fallback
                .get_by_id(user_id)
                .await
                .map_err(|_| AuthError::StoreUnavailable(msg)),
            Err(e) => Err(e),
        }
    }

    /// Every registered account, newest first. Served from the fallback cache
    /// when the durable store is unreachable.
    pub async fn list_accounts(&self) -> Result<Vec<UserRecord>, AuthError> {
        match self.store.list().await {
            Ok(rows) => Ok(rows),
            Err(AuthError::StoreUnavailable(msg)) => {
                warn!("Store unreachable ({}), listing accounts from fallback", msg);
                self.fallback.list().await
            }
            Err(e) => Err(e),
        }
    }

    /// Remove the account and every appointment booked under its email.
    /// Returns how many appointments went with it.
    pub async fn delete_account(&self, user_id: &str) -> Result<usize, AuthError> {
        let user = self.get_account(user_id).await?;

        match self.store.delete(user_id).await {
            Ok(()) => {
                let _ = self.fallback.delete(user_id).await;
            }
            Err(AuthError::NotFound) => self.fallback.delete(user_id).await?,
            Err(AuthError::StoreUnavailable(msg)) => {
                self.fallback
                    .delete(user_id)
                    .await
                    .map_err(|_| AuthError::StoreUnavailable(msg))?;
            }
            Err(e) => return Err(e),
        }

        let removed = self
            .appointments
            .delete_appointments_for_email(&user.email)
            .await?;
        info!(
            "Account {} deleted along with {} appointment(s)",
            user_id, removed
        );
        Ok(removed)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        match self.store.get_by_email(email).await {
            Ok(Some(user)) => Ok(Some(user)),
            Ok(None) => self.fallback.get_by_email(email).await,
            Err(AuthError::StoreUnavailable(msg)) => {
                warn!("Store unreachable ({}), reading accounts from fallback", msg);
                self.fallback.get_by_email(email).await
            }
            Err(e) => Err(e),
        }
    }

    fn issue(&self, user: &UserRecord) -> Result<String, AuthError> {
        issue_token(
            &user.id,
            &user.email,
            &user.role,
            &self.jwt_secret,
            TOKEN_TTL_HOURS,
        )
        .map_err(AuthError::Token)
    }
}
