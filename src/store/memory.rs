//! In-process cache store
//!
//! String keys live in a `DashMap` with per-entry expiry instants; expired
//! entries are treated as absent on every read and removed by
//! [`MemoryStore::cleanup_expired`]. Sets never expire.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::CacheStore;
use crate::error::{StoreError, StoreResult};

/// A stored string value
#[derive(Debug, Clone)]
struct StoreEntry {
    value: String,
    /// `None` means the key never expires
    expires_at: Option<Instant>,
}

impl StoreEntry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}

/// DashMap-backed [`CacheStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoreEntry>,
    sets: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `member` to the set at `set`, returning `true` if it was new
    pub fn sadd(&self, set: &str, member: impl Into<String>) -> bool {
        self.sets
            .write()
            .entry(set.to_string())
            .or_default()
            .insert(member.into())
    }

    /// Remove `member` from the set at `set`, returning `true` if it was present
    pub fn srem(&self, set: &str, member: &str) -> bool {
        self.sets
            .write()
            .get_mut(set)
            .is_some_and(|members| members.remove(member))
    }

    /// Number of live (non-expired) string keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_expired()).count()
    }

    /// Whether the store holds no live string keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove expired string keys
    ///
    /// # Returns
    /// The number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(StoreEntry::new(value.to_string(), Some(ttl)));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoreEntry::new(value.to_string(), Some(ttl)));
                Ok(true)
            }
        }
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        Ok(self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .and_then(|entry| entry.remaining_ttl()))
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoreEntry::new("0".into(), None));

        if entry.is_expired() {
            *entry = StoreEntry::new("0".into(), None);
        }

        let current: i64 = entry
            .value
            .parse()
            .map_err(|_| StoreError::invalid_value(key, "value is not an integer"))?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::invalid_value(key, "increment would overflow"))?;

        entry.value = next.to_string();
        Ok(next)
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired()))
    }

    async fn sismember(&self, set: &str, member: &str) -> StoreResult<bool> {
        Ok(self
            .sets
            .read()
            .get(set)
            .is_some_and(|members| members.contains(member)))
    }
}
