//! Session store: the signed-in identity and its bearer token.
//!
//! The identity lives in memory; the token (and a cached copy of the
//! identity, so a later process can resume) live in the state store.

mod identity;
mod storage;

pub use identity::{
    AdminSession, AreaSession, AttendantSession, CustomerSession, Identity, LoginRole, Role,
    Session,
};
pub use storage::{FileStateStore, MemoryStateStore, StateStore};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "fuelpoa_jwt";

/// Storage key for the cached identity
pub const IDENTITY_KEY: &str = "fuelpoa_identity";

pub struct SessionStore {
    identity: Option<Identity>,
    storage: Box<dyn StateStore>,
}

impl SessionStore {
    pub fn new(storage: Box<dyn StateStore>) -> Self {
        Self {
            identity: None,
            storage,
        }
    }

    pub fn current_identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn session(&self) -> Option<Session> {
        self.identity.clone().map(Session::from_identity)
    }

    /// Persisted bearer token, if any
    pub fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Failed to read session token: {:#}", e);
                None
            }
        }
    }

    /// Store a freshly signed-in identity.
    ///
    /// Everything is written to storage before the in-memory identity is
    /// replaced, so a storage failure leaves the store as it was.
    pub fn begin(&mut self, identity: Identity, token: Option<&str>) -> Result<()> {
        let cached = serde_json::to_string(&identity).context("Failed to encode identity")?;
        self.storage.set(IDENTITY_KEY, &cached)?;
        match token {
            Some(token) => self.storage.set(TOKEN_KEY, token)?,
            None => self.storage.remove(TOKEN_KEY)?,
        }
        debug!(user = %identity.id, role = %identity.role, "Session started");
        self.identity = Some(identity);
        Ok(())
    }

    /// Drop the identity and token. Always succeeds; storage errors are logged.
    pub fn clear(&mut self) {
        self.identity = None;
        for key in [TOKEN_KEY, IDENTITY_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to remove {} from state: {:#}", key, e);
            }
        }
    }

    /// Resume a session saved by an earlier process.
    ///
    /// Needs both a token and a readable cached identity; anything else
    /// leaves the store signed out.
    pub fn restore(&mut self) -> Option<&Identity> {
        if self.token().is_none() {
            return None;
        }
        let cached = match self.storage.get(IDENTITY_KEY) {
            Ok(Some(cached)) => cached,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cached identity: {:#}", e);
                return None;
            }
        };
        match serde_json::from_str::<Identity>(&cached) {
            Ok(identity) => {
                debug!(user = %identity.id, "Restored session");
                self.identity = Some(identity);
                self.identity.as_ref()
            }
            Err(e) => {
                warn!("Ignoring unreadable cached identity: {}", e);
                None
            }
        }
    }
}
