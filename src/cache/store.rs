//! Shard Store Module
//!
//! Bounded key-value storage combining a HashMap with a pluggable eviction
//! policy. Not synchronized on its own: the owning `Shard` wraps it.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheStats, EvictionPolicy, LruTracker};

// == Shard Store ==
/// Capacity-bounded storage for a single shard.
#[derive(Debug)]
pub struct ShardStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Recency (or other) ordering used to pick eviction victims
    policy: Box<dyn EvictionPolicy>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl ShardStore {
    // == Constructor ==
    /// Creates a new store with LRU eviction.
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, Box::new(LruTracker::new()))
    }

    /// Creates a new store with a caller-supplied eviction policy.
    pub fn with_policy(capacity: usize, policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            policy,
            stats: CacheStats::new(),
            capacity,
        }
    }

    // == Set ==
    /// Stores a key-value pair.
    ///
    /// Existing keys are overwritten in place and promoted. New keys evict
    /// one victim first when the store is full. Returns the evicted entry.
    pub fn set(&mut self, key: String, value: String) -> Option<CacheEntry> {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.overwrite(value);
            self.policy.record_access(&key);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        self.policy.record_insert(&key);
        self.entries
            .insert(key.clone(), CacheEntry::new(key, value));
        self.stats.set_total_entries(self.entries.len());

        evicted
    }

    // == Get ==
    /// Retrieves a value by key and promotes it to most recently used.
    pub fn get(&mut self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(entry) => {
                let value = entry.value.clone();
                self.policy.record_access(key);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Evict ==
    /// Removes the victim chosen by the eviction policy. No-op when empty.
    pub fn evict(&mut self) -> Option<CacheEntry> {
        let victim = self.policy.evict()?;
        let entry = self.entries.remove(&victim);
        if entry.is_some() {
            self.stats.record_eviction();
            self.stats.set_total_entries(self.entries.len());
        }
        entry
    }

    // == Remove ==
    /// Removes an entry by key.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.remove_if(key, |_| true)
    }

    /// Removes the entry under `key` only if `predicate` accepts it.
    pub fn remove_if<F>(&mut self, key: &str, predicate: F) -> Option<CacheEntry>
    where
        F: FnOnce(&CacheEntry) -> bool,
    {
        if !self.entries.get(key).is_some_and(predicate) {
            return None;
        }

        let entry = self.entries.remove(key);
        self.policy.remove(key);
        self.stats.set_total_entries(self.entries.len());
        entry
    }

    // == Staleness Scan ==
    /// Keys (with their write time) of every entry older than `threshold`.
    pub fn stale_entries(&self, now: Instant, threshold: Duration) -> Vec<(String, Instant)> {
        self.entries
            .values()
            .filter(|entry| entry.is_stale(now, threshold))
            .map(|entry| (entry.key.clone(), entry.last_written))
            .collect()
    }

    /// Keys whose current value equals `value`.
    pub fn keys_with_value(&self, value: &str) -> Vec<String> {
        self.entries
            .values()
            .filter(|entry| entry.value == value)
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Looks at an entry without touching recency or counters.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.stats.record_invalidations(count);
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the map and the eviction policy track the same key set and
    /// the store is within capacity.
    pub fn is_consistent(&self) -> bool {
        self.policy.len() == self.entries.len()
            && self.entries.keys().all(|key| self.policy.contains(key))
            && self.entries.len() <= self.capacity
    }

    /// Snapshot of the stored keys.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
