// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use shared_database::memory::{CacheUpdate, MemoryCache};
use shared_database::supabase::{DbError, SupabaseClient};
use shared_models::appointment::{Appointment, AppointmentStatus, PaymentStatus};

use crate::models::AppointmentError;

const TABLE: &str = "appointments";

/// Exact-match listing filter.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub email: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub payment_reference: Option<String>,
}

/// Partial update applied by the lifecycle controller. `None` fields are left
/// untouched by the store.
#[derive(Debug, Clone, Default)]
pub struct AppointmentChanges {
    pub status: Option<AppointmentStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_reference: Option<String>,
    pub amount: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AppointmentChanges {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(status) = self.status {
            map.insert("status".into(), json!(status));
        }
        if let Some(payment_status) = self.payment_status {
            map.insert("payment_status".into(), json!(payment_status));
        }
        if let Some(reference) = &self.payment_reference {
            map.insert("payment_reference".into(), json!(reference));
        }
        if let Some(amount) = self.amount {
            map.insert("amount".into(), json!(amount));
        }
        if let Some(updated_at) = self.updated_at {
            map.insert("updated_at".into(), json!(updated_at));
        }
        Value::Object(map)
    }

    fn apply(&self, appointment: &mut Appointment) {
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(payment_status) = self.payment_status {
            appointment.payment_status = payment_status;
        }
        if let Some(reference) = &self.payment_reference {
            appointment.payment_reference = Some(reference.clone());
        }
        if let Some(amount) = self.amount {
            appointment.amount = Some(amount);
        }
        if let Some(updated_at) = self.updated_at {
            appointment.updated_at = updated_at;
        }
    }
}

/// Result of a conditional update keyed on the previously observed status.
#[derive(Debug)]
pub enum GuardedUpdate {
    Applied(Appointment),
    /// Another writer got there first; carries the row as it stands now.
    Lost(Appointment),
}

/// Persistence contract for appointments, independent of the backing
/// technology. Transport failures surface as `StoreUnavailable` so the
/// controller can fall back to the in-memory cache.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;
    async fn get_by_id(&self, id: &str) -> Result<Appointment, AppointmentError>;
    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError>;
    async fn update(
        &self,
        id: &str,
        changes: &AppointmentChanges,
    ) -> Result<Appointment, AppointmentError>;
    /// Atomic read-modify-write: the write only lands if the row still has
    /// `expected` status when the store applies it.
    async fn update_guarded(
        &self,
        id: &str,
        expected: AppointmentStatus,
        changes: &AppointmentChanges,
    ) -> Result<GuardedUpdate, AppointmentError>;
    async fn delete(&self, id: &str) -> Result<(), AppointmentError>;
    async fn delete_by_email(&self, email: &str) -> Result<usize, AppointmentError>;
}

fn validate_record(appointment: &Appointment) -> Result<(), AppointmentError> {
    let mut missing = Vec::new();
    let required = [
        ("patient_name", &appointment.patient_name),
        ("email", &appointment.email),
        ("service", &appointment.service),
        ("date", &appointment.date),
        ("time", &appointment.time),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            missing.push(name.to_string());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppointmentError::Validation(missing))
    }
}

fn map_db_error(e: DbError) -> AppointmentError {
    match e {
        DbError::Unavailable(msg) => AppointmentError::StoreUnavailable(msg),
        DbError::NotFound(_) => AppointmentError::NotFound,
        other => AppointmentError::Database(other.to_string()),
    }
}

// ==============================================================================
// SUPABASE-BACKED STORE
// ==============================================================================

pub struct SupabaseStore {
    client: Arc<SupabaseClient>,
}

impl SupabaseStore {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }

    fn id_query(id: &str) -> String {
        format!("id=eq.{}", urlencoding::encode(id))
    }
}

#[async_trait]
impl AppointmentStore for SupabaseStore {
    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        validate_record(&appointment)?;
        let row = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::Database(e.to_string()))?;
        self.client.insert(TABLE, row).await.map_err(map_db_error)
    }

    async fn get_by_id(&self, id: &str) -> Result<Appointment, AppointmentError> {
        let query = format!("select=*&{}", Self::id_query(id));
        let mut rows: Vec<Appointment> = self
            .client
            .select(TABLE, &query)
            .await
            .map_err(map_db_error)?;
        rows.pop().ok_or(AppointmentError::NotFound)
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query = String::from("select=*&order=created_at.desc");
        if let Some(email) = &filter.email {
            query.push_str(&format!("&email=eq.{}", urlencoding::encode(email)));
        }
        if let Some(status) = filter.status {
            query.push_str(&format!("&status=eq.{}", status));
        }
        if let Some(reference) = &filter.payment_reference {
            query.push_str(&format!(
                "&payment_reference=eq.{}",
                urlencoding::encode(reference)
            ));
        }
        self.client.select(TABLE, &query).await.map_err(map_db_error)
    }

    async fn update(
        &self,
        id: &str,
        changes: &AppointmentChanges,
    ) -> Result<Appointment, AppointmentError> {
        let mut rows: Vec<Appointment> = self
            .client
            .update(TABLE, &Self::id_query(id), changes.to_json())
            .await
            .map_err(map_db_error)?;
        rows.pop().ok_or(AppointmentError::NotFound)
    }

    async fn update_guarded(
        &self,
        id: &str,
        expected: AppointmentStatus,
        changes: &AppointmentChanges,
    ) -> Result<GuardedUpdate, AppointmentError> {
        // Filter and write travel in one PATCH, so the status check is atomic
        // inside the database.
        let query = format!("{}&status=eq.{}", Self::id_query(id), expected);
        let mut rows: Vec<Appointment> = self
            .client
            .update(TABLE, &query, changes.to_json())
            .await
            .map_err(map_db_error)?;

        match rows.pop() {
            Some(updated) => Ok(GuardedUpdate::Applied(updated)),
            None => {
                // Either the row is gone or someone else moved it first.
                let current = self.get_by_id(id).await?;
                Ok(GuardedUpdate::Lost(current))
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<(), AppointmentError> {
        let removed = self
            .client
            .delete(TABLE, &Self::id_query(id))
            .await
            .map_err(map_db_error)?;
        if removed.is_empty() {
            return Err(AppointmentError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_email(&self, email: &str) -> Result<usize, AppointmentError> {
        let query = format!("email=eq.{}", urlencoding::encode(email));
        let removed = self
            .client
            .delete(TABLE, &query)
            .await
            .map_err(map_db_error)?;
        Ok(removed.len())
    }
}

// ==============================================================================
// IN-MEMORY STORE (fallback cache / test backend)
// ==============================================================================

pub struct MemoryStore {
    cache: Arc<MemoryCache>,
}

impl MemoryStore {
    pub fn new(cache: Arc<MemoryCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        validate_record(&appointment)?;
        self.cache.insert(appointment.clone()).await;
        Ok(appointment)
    }

    async fn get_by_id(&self, id: &str) -> Result<Appointment, AppointmentError> {
        self.cache.get(id).await.ok_or(AppointmentError::NotFound)
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let mut rows = self
            .cache
            .list(filter.email.as_deref(), filter.status)
            .await;
        if let Some(reference) = &filter.payment_reference {
            rows.retain(|a| a.payment_reference.as_deref() == Some(reference.as_str()));
        }
        Ok(rows)
    }

    async fn update(
        &self,
        id: &str,
        changes: &AppointmentChanges,
    ) -> Result<Appointment, AppointmentError> {
        match self
            .cache
            .modify(id, |row| {
                changes.apply(row);
                true
            })
            .await
        {
            CacheUpdate::Updated(row) => Ok(row),
            CacheUpdate::Rejected(_) | CacheUpdate::Missing => Err(AppointmentError::NotFound),
        }
    }

    async fn update_guarded(
        &self,
        id: &str,
        expected: AppointmentStatus,
        changes: &AppointmentChanges,
    ) -> Result<GuardedUpdate, AppointmentError> {
        match self
            .cache
            .modify(id, |row| {
                if row.status != expected {
                    return false;
                }
                changes.apply(row);
                true
            })
            .await
        {
            CacheUpdate::Updated(row) => Ok(GuardedUpdate::Applied(row)),
            CacheUpdate::Rejected(current) => Ok(GuardedUpdate::Lost(current)),
            CacheUpdate::Missing => Err(AppointmentError::NotFound),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), AppointmentError> {
        if self.cache.remove(id).await {
            Ok(())
        } else {
            Err(AppointmentError::NotFound)
        }
    }

    async fn delete_by_email(&self, email: &str) -> Result<usize, AppointmentError> {
        Ok(self.cache.remove_by_email(email).await)
    }
}
