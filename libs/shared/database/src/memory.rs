// libs/shared/database/src/memory.rs
use std::collections::HashMap;

use tokio::sync::RwLock;

use shared_models::appointment::{Appointment, AppointmentStatus};

/// Outcome of a guarded in-place update.
#[derive(Debug)]
pub enum CacheUpdate {
    /// No row with that id.
    Missing,
    /// The row exists but the guard closure declined to touch it.
    Rejected(Appointment),
    Updated(Appointment),
}

/// Process-wide appointment cache.
///
/// Serves two roles: the fallback store while Supabase is unreachable, and the
/// whole store when no database is configured. All mutation happens under the
/// write lock, so guarded updates are atomic.
#[derive(Default)]
pub struct MemoryCache {
    rows: RwLock<HashMap<String, Appointment>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, appointment: Appointment) {
        self.rows
            .write()
            .await
            .insert(appointment.id.clone(), appointment);
    }

    pub async fn get(&self, id: &str) -> Option<Appointment> {
        self.rows.read().await.get(id).cloned()
    }

    /// Apply `f` to the row under the write lock. `f` returns whether the
    /// mutation should go ahead; a `false` leaves the row untouched.
    pub async fn modify<F>(&self, id: &str, f: F) -> CacheUpdate
    where
        F: FnOnce(&mut Appointment) -> bool,
    {
        let mut rows = self.rows.write().await;
        match rows.get_mut(id) {
            None => CacheUpdate::Missing,
            Some(row) => {
                let before = row.clone();
                if f(row) {
                    CacheUpdate::Updated(row.clone())
                } else {
                    *row = before.clone();
                    CacheUpdate::Rejected(before)
                }
            }
        }
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.rows.write().await.remove(id).is_some()
    }

    pub async fn remove_by_email(&self, email: &str) -> usize {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, a| a.email != email);
        before - rows.len()
    }

    /// Matching rows, most recent first.
    pub async fn list(
        &self,
        email: Option<&str>,
        status: Option<AppointmentStatus>,
    ) -> Vec<Appointment> {
        let rows = self.rows.read().await;
        let mut matched: Vec<Appointment> = rows
            .values()
            .filter(|a| email.map_or(true, |e| a.email == e))
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}
