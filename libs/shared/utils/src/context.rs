use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::memory::MemoryCache;
use shared_database::users::UserCache;

use crate::csrf::CsrfTokenStore;

/// Everything a request handler needs, constructed once in `main` and passed
/// as axum state. The only mutable pieces are the fallback caches and the
/// anti-forgery token set.
pub struct AppContext {
    pub config: AppConfig,
    pub appointment_cache: Arc<MemoryCache>,
    pub user_cache: Arc<UserCache>,
    pub csrf_tokens: Arc<CsrfTokenStore>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            appointment_cache: Arc::new(MemoryCache::new()),
            user_cache: Arc::new(UserCache::new()),
            csrf_tokens: Arc::new(CsrfTokenStore::new()),
        }
    }
}
