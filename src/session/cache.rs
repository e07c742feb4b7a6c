//! Local identity cache: a best-effort mirror of the session user.
//!
//! The primary key holds the serialized [`User`]. [`SESSION_COOKIE_KEY`]
//! holds the transport's session cookie so a later process can resume the
//! server session. [`LEGACY_KEYS`] are left over from older session formats;
//! they are never written, only removed on logout.

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;

use std::sync::Arc;

use crate::net::types::User;
use crate::storage::{KeyValueStore, StoreError};

pub const USER_KEY: &str = "user";
pub const SESSION_COOKIE_KEY: &str = "session_cookie";
pub const LEGACY_KEYS: [&str; 2] = ["auth_token", "token"];

/// Outcome of reading the cached identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedIdentity {
    Missing,
    Found(User),
    /// Something is stored but it is not a valid user.
    Corrupt,
}

pub struct IdentityCache {
    store: Arc<dyn KeyValueStore>,
}

impl IdentityCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn load(&self) -> CachedIdentity {
        match self.store.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => CachedIdentity::Found(user),
                Err(error) => {
                    tracing::warn!(%error, "cached identity does not parse");
                    CachedIdentity::Corrupt
                }
            },
            Ok(None) => CachedIdentity::Missing,
            Err(error @ StoreError::Corrupt { .. }) => {
                tracing::warn!(%error, "identity store is corrupt");
                CachedIdentity::Corrupt
            }
            Err(error) => {
                tracing::warn!(%error, "identity store read failed");
                CachedIdentity::Missing
            }
        }
    }

    pub fn save(&self, user: &User) {
        let raw = match serde_json::to_string(user) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(%error, "identity encode failed");
                return;
            }
        };
        if let Err(error) = self.store.set(USER_KEY, &raw) {
            tracing::warn!(%error, user_id = %user.id, "identity cache write failed");
        }
    }

    #[must_use]
    pub fn load_cookie(&self) -> Option<String> {
        match self.store.get(SESSION_COOKIE_KEY) {
            Ok(cookie) => cookie.filter(|cookie| !cookie.trim().is_empty()),
            Err(error) => {
                tracing::warn!(%error, "session cookie read failed");
                None
            }
        }
    }

    pub fn save_cookie(&self, cookie: &str) {
        if let Err(error) = self.store.set(SESSION_COOKIE_KEY, cookie) {
            tracing::warn!(%error, "session cookie write failed");
        }
    }

    /// Remove the identity key and the saved session cookie.
    pub fn clear_user(&self) {
        self.remove(USER_KEY);
        self.remove(SESSION_COOKIE_KEY);
    }

    /// Remove the identity key, the saved session cookie, and every legacy key.
    pub fn clear_all(&self) {
        self.clear_user();
        for key in LEGACY_KEYS {
            self.remove(key);
        }
    }

    fn remove(&self, key: &str) {
        if let Err(error) = self.store.remove(key) {
            tracing::warn!(%error, key, "identity cache remove failed");
        }
    }
}
