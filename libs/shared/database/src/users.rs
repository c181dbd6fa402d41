// libs/shared/database/src/users.rs
use std::collections::HashMap;

use tokio::sync::RwLock;

use shared_models::auth::UserRecord;

/// Process-wide account cache, the user-table counterpart of
/// [`crate::memory::MemoryCache`]. Fallback store while Supabase is
/// unreachable and the whole store when no database is configured.
#[derive(Default)]
pub struct UserCache {
    rows: RwLock<HashMap<String, UserRecord>>,
}

impl UserCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: UserRecord) {
        self.rows.write().await.insert(user.id.clone(), user);
    }

    pub async fn get(&self, id: &str) -> Option<UserRecord> {
        self.rows.read().await.get(id).cloned()
    }

    pub async fn get_by_email(&self, email: &str) -> Option<UserRecord> {
        self.rows
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    /// Every account, newest first.
    pub async fn list(&self) -> Vec<UserRecord> {
        let mut rows: Vec<UserRecord> = self.rows.read().await.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.rows.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}
