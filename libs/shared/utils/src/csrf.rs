use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::RngCore;
use tracing::debug;

const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Process-wide anti-forgery token set.
///
/// Tokens are opaque random strings handed to browsers before state-changing
/// requests. The map's own lock is the only synchronization; a periodic sweep
/// (hourly, spawned in `main`) drops expired entries.
pub struct CsrfTokenStore {
    ttl: Duration,
    tokens: Mutex<HashMap<String, Instant>>,
}

impl CsrfTokenStore {
    pub fn new() -> Self {
        Self::with_ttl(TOKEN_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        self.tokens
            .lock()
            .expect("csrf token lock poisoned")
            .insert(token.clone(), Instant::now());
        token
    }

    pub fn validate(&self, token: &str) -> bool {
        let tokens = self.tokens.lock().expect("csrf token lock poisoned");
        match tokens.get(token) {
            Some(issued_at) => issued_at.elapsed() < self.ttl,
            None => false,
        }
    }

    /// Drop expired tokens, returning how many were removed.
    pub fn prune(&self) -> usize {
        let mut tokens = self.tokens.lock().expect("csrf token lock poisoned");
        let before = tokens.len();
        let ttl = self.ttl;
        tokens.retain(|_, issued_at| issued_at.elapsed() < ttl);
        let removed = before - tokens.len();
        if removed > 0 {
            debug!("Pruned {} expired CSRF tokens", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().expect("csrf token lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CsrfTokenStore {
    fn default() -> Self {
        Self::new()
    }
}
