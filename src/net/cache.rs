//! Short-lived cache of GET responses.
//!
//! Authorization-scoped payloads must not survive an identity change, so the
//! session layer clears this cache on every login, signup, and logout. Each
//! clear starts a new generation; a response fetched under an older
//! generation is discarded instead of stored.

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::Value;

struct CachedResponse {
    stored_at: Instant,
    value: Value,
}

#[derive(Default)]
struct Entries {
    generation: u64,
    by_key: HashMap<String, CachedResponse>,
}

/// TTL cache keyed by request URL.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<Entries>,
}

impl ResponseCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(Entries::default()) }
    }

    /// Fresh cached value for `key`; stale entries are evicted on read.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.lock();
        let fresh = entries
            .by_key
            .get(key)
            .map(|entry| (entry.stored_at.elapsed() < self.ttl, entry.value.clone()));
        match fresh {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                entries.by_key.remove(key);
                None
            }
            None => None,
        }
    }

    /// Current generation. Capture it before a fetch and hand it to
    /// [`ResponseCache::put_if_current`] afterwards.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Store under the current generation.
    pub fn put(&self, key: impl Into<String>, value: Value) {
        let mut entries = self.lock();
        let generation = entries.generation;
        self.insert(&mut entries, generation, key.into(), value);
    }

    /// Store `value` only if no clear happened since `generation` was read.
    /// Returns whether the value was kept.
    pub fn put_if_current(&self, generation: u64, key: impl Into<String>, value: Value) -> bool {
        let mut entries = self.lock();
        self.insert(&mut entries, generation, key.into(), value)
    }

    fn insert(&self, entries: &mut Entries, generation: u64, key: String, value: Value) -> bool {
        if self.ttl.is_zero() || generation != entries.generation {
            return false;
        }
        let ttl = self.ttl;
        entries.by_key.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.by_key.insert(key, CachedResponse { stored_at: Instant::now(), value });
        true
    }

    /// Drop every entry and start a new generation, returning how many
    /// entries were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        entries.generation = entries.generation.wrapping_add(1);
        let dropped = entries.by_key.len();
        entries.by_key.clear();
        dropped
    }

    /// Drop entries whose key starts with `prefix`, returning how many were removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.by_key.len();
        entries.by_key.retain(|key, _| !key.starts_with(prefix));
        before - entries.by_key.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // Entries are plain data; a panic mid-update cannot leave them inconsistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
