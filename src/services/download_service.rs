use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};
use crate::models::application::DocumentKind;
use crate::utils::time::Clock;
use crate::utils::token::generate_access_token;

/// A one-time, expiring credential for a finished editing deliverable.
#[derive(Debug, Clone)]
pub struct DownloadGrant {
    pub email: String,
    pub kind: DocumentKind,
    pub stored_path: String,
    pub original_name: String,
    pub expires_at: DateTime<Utc>,
}

/// Token table with an injected clock. Tokens are single-use: removed on
/// first successful redeem or on expiry. Redemption after expiry fails
/// closed.
pub struct DownloadTokenStore {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    tokens: Mutex<HashMap<String, DownloadGrant>>,
}

impl DownloadTokenStore {
    pub fn new(ttl_minutes: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes),
            clock,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes()
    }

    pub fn issue(
        &self,
        email: &str,
        kind: DocumentKind,
        stored_path: &str,
        original_name: &str,
    ) -> String {
        let token = generate_access_token(48);
        let grant = DownloadGrant {
            email: email.to_string(),
            kind,
            stored_path: stored_path.to_string(),
            original_name: original_name.to_string(),
            expires_at: self.clock.now() + self.ttl,
        };
        self.tokens
            .lock()
            .expect("token table mutex poisoned")
            .insert(token.clone(), grant);
        token
    }

    pub fn redeem(&self, token: &str) -> Result<DownloadGrant> {
        let mut table = self.tokens.lock().expect("token table mutex poisoned");
        let grant = table
            .remove(token)
            .ok_or_else(|| Error::NotFound("Invalid download token".to_string()))?;
        if grant.expires_at <= self.clock.now() {
            return Err(Error::NotFound("Invalid download token".to_string()));
        }
        Ok(grant)
    }

    /// Passive reclamation of expired tokens, driven by a periodic task.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut table = self.tokens.lock().expect("token table mutex poisoned");
        let before = table.len();
        table.retain(|_, grant| grant.expires_at > now);
        before - table.len()
    }
}
