//! Admin sessions with sliding expiry
//!
//! A session id maps to a [`SessionRecord`] stored with a TTL. Every
//! successful validation re-stamps `login_time` and renews the TTL, so an
//! admin who makes at least one request per TTL window stays logged in.
//! Expiry is also checked against `login_time` on read; the store TTL is
//! only a backstop.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{AuthConfig, StoreKeys};
use crate::database::{put_json, SharedStore};
use crate::errors::{AppError, AppResult};
use crate::models::SessionRecord;
use crate::utils::Clock;

pub const SESSION_ID_LEN: usize = 48;

#[derive(Clone)]
pub struct SessionManager {
    store: SharedStore,
    keys: StoreKeys,
    clock: Arc<dyn Clock>,
    username: String,
    password: String,
    ttl: chrono::Duration,
}

impl SessionManager {
    pub fn new(store: SharedStore, keys: &StoreKeys, clock: Arc<dyn Clock>, auth: &AuthConfig) -> Self {
        Self {
            store,
            keys: keys.clone(),
            clock,
            username: auth.username.clone(),
            password: auth.password.clone(),
            ttl: auth.session_ttl(),
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Check credentials and open a session, returning its id
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        user_agent: Option<&str>,
    ) -> AppResult<String> {
        // Evaluate both comparisons so timing does not reveal which one failed
        let username_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let password_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        if !(username_ok & password_ok) {
            warn!("Rejected admin login attempt");
            return Err(AppError::AuthFailure);
        }

        let session_id = generate_session_id();
        let record = SessionRecord {
            username: username.to_string(),
            login_time: self.clock.now(),
            user_agent: user_agent.map(str::to_string),
        };
        self.persist(&session_id, &record).await?;

        info!("Admin '{}' logged in", username);
        Ok(session_id)
    }

    /// Resolve a session id to its username, sliding the expiry window
    pub async fn validate(&self, session_id: &str) -> AppResult<String> {
        if !is_well_formed(session_id) {
            return Err(AppError::InvalidSession);
        }

        let key = self.keys.session(session_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Err(AppError::InvalidSession);
        };

        let mut record: SessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("Discarding unreadable session record: {}", e);
                self.store.delete(&key).await?;
                return Err(AppError::InvalidSession);
            }
        };

        let now = self.clock.now();
        if now.signed_duration_since(record.login_time) > self.ttl {
            debug!("Session for '{}' expired", record.username);
            self.store.delete(&key).await?;
            return Err(AppError::InvalidSession);
        }

        record.login_time = now;
        self.persist(session_id, &record).await?;
        Ok(record.username)
    }

    /// Destroy a session. Unknown or malformed ids are ignored.
    pub async fn logout(&self, session_id: &str) -> AppResult<()> {
        if is_well_formed(session_id) {
            self.store.delete(&self.keys.session(session_id)).await?;
            debug!("Session closed");
        }
        Ok(())
    }

    async fn persist(&self, session_id: &str, record: &SessionRecord) -> AppResult<()> {
        let ttl = self
            .ttl
            .to_std()
            .map_err(|e| AppError::configuration(format!("invalid session ttl: {}", e)))?;
        put_json(
            self.store.as_ref(),
            &self.keys.session(session_id),
            record,
            Some(ttl),
        )
        .await?;
        Ok(())
    }
}

fn generate_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

fn is_well_formed(session_id: &str) -> bool {
    session_id.len() == SESSION_ID_LEN && session_id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Constant-time byte comparison. Compares every byte regardless of where
/// the first mismatch occurs.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
