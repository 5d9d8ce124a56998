//! Shard Module
//!
//! One independently locked partition of the cache. Every operation first
//! takes the key's stripe lock, then the store mutex for the short mutation,
//! always in that order.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Invalidation, KeyLockTable, ShardStore};

// == Shard ==
/// Bounded LRU partition with its own key-lock table.
#[derive(Debug)]
pub struct Shard {
    id: String,
    topic: String,
    store: Mutex<ShardStore>,
    locks: KeyLockTable,
}

impl Shard {
    // == Constructor ==
    /// Creates an empty shard holding at most `capacity` entries.
    pub fn new(id: impl Into<String>, capacity: usize, lock_stripes: usize) -> Self {
        let id = id.into();
        Self {
            topic: Self::topic_for(&id),
            id,
            store: Mutex::new(ShardStore::new(capacity)),
            locks: KeyLockTable::new(lock_stripes),
        }
    }

    /// Invalidation topic name of the shard called `id`.
    pub fn topic_for(id: &str) -> String {
        format!("evict-{}", id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    // == Set ==
    /// Writes `value` under `key`, evicting the LRU entry when full.
    pub fn set(&self, key: String, value: String) {
        let _key_guard = self.locks.lock(&key);
        let evicted = self.store.lock().set(key.clone(), value);

        debug!(shard = %self.id, key = %key, "SET");
        if let Some(entry) = evicted {
            debug!(shard = %self.id, key = %entry.key, "Evicted least recently used entry");
        }
    }

    // == Get ==
    /// Reads `key` and promotes it. Absence is a normal outcome.
    pub fn get(&self, key: &str) -> Option<String> {
        let _key_guard = self.locks.lock(key);
        self.store.lock().get(key)
    }

    // == Handle Invalidation ==
    /// Removes every entry matching `invalidation`, locking one key at a time.
    ///
    /// Returns the number of entries removed.
    pub fn handle_invalidation(&self, invalidation: &Invalidation) -> usize {
        let candidates = match invalidation {
            Invalidation::Key(key) | Invalidation::StaleKey { key, .. } => vec![key.clone()],
            Invalidation::Value(value) => self.store.lock().keys_with_value(value),
        };

        let mut removed = 0;
        for key in candidates {
            let _key_guard = self.locks.lock(&key);
            let mut store = self.store.lock();

            // The entry may have changed since the candidate list was built
            if store
                .remove_if(&key, |entry| invalidation.matches(entry))
                .is_some()
            {
                store.record_invalidations(1);
                removed += 1;
                debug!(shard = %self.id, key = %key, "Invalidated entry");
            }
        }

        removed
    }

    // == Retain ==
    /// Drops every entry whose key `keep` rejects, locking one key at a time.
    ///
    /// Used when routing changes and some keys stop belonging here. Returns
    /// the number of entries removed.
    pub fn retain_keys<F>(&self, keep: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let candidates: Vec<String> = self
            .store
            .lock()
            .keys()
            .into_iter()
            .filter(|key| !keep(key))
            .collect();

        let mut removed = 0;
        for key in candidates {
            let _key_guard = self.locks.lock(&key);
            if self.store.lock().remove(&key).is_some() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(shard = %self.id, removed, "Dropped entries routed elsewhere");
        }
        removed
    }

    // == Staleness Scan ==
    /// Read-only snapshot of entries older than `threshold` at `now`.
    pub fn stale_entries(&self, now: Instant, threshold: Duration) -> Vec<(String, Instant)> {
        self.store.lock().stale_entries(now, threshold)
    }

    /// Clone of the entry under `key`, without promoting it.
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.store.lock().peek(key).cloned()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    pub fn capacity(&self) -> usize {
        self.store.lock().capacity()
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// True when the store's map and recency order agree.
    pub fn is_consistent(&self) -> bool {
        self.store.lock().is_consistent()
    }
}
