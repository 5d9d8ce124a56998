//! Consistent Hash Ring
//!
//! Maps keys onto shard identifiers through weighted virtual positions.

use std::collections::{HashMap, HashSet};

/// Hash used both to place virtual positions and to look keys up.
pub type HashFn = fn(&[u8]) -> u32;

/// Default ring hash: CRC-32 (IEEE), stable across restarts and platforms.
pub fn default_hash(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// == Hash Ring ==
/// Sorted ring of virtual positions, each owned by one shard.
#[derive(Debug, Clone)]
pub struct HashRing {
    /// Sorted, deduplicated virtual positions
    positions: Vec<u32>,
    /// Position -> shards that placed it, in insertion order. The last one owns it.
    claims: HashMap<u32, Vec<String>>,
    /// Shards currently registered
    members: HashSet<String>,
    /// Virtual positions per shard
    replicas: usize,
    hash_fn: HashFn,
}

impl HashRing {
    // == Constructor ==
    /// Creates an empty ring using CRC-32.
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, default_hash)
    }

    /// Creates an empty ring with a custom hash function.
    pub fn with_hasher(replicas: usize, hash_fn: HashFn) -> Self {
        Self {
            positions: Vec::new(),
            claims: HashMap::new(),
            members: HashSet::new(),
            replicas: replicas.max(1),
            hash_fn,
        }
    }

    fn virtual_positions<'a>(&'a self, id: &'a str) -> impl Iterator<Item = u32> + 'a {
        (0..self.replicas).map(move |i| (self.hash_fn)(format!("{}{}", i, id).as_bytes()))
    }

    // == Add Shard ==
    /// Places `replicas` virtual positions for `id`.
    ///
    /// Returns false if the shard was already on the ring. A position that
    /// collides with an existing one is taken over by `id`; the previous
    /// owner gets it back if `id` leaves.
    pub fn add_shard(&mut self, id: &str) -> bool {
        if !self.members.insert(id.to_string()) {
            return false;
        }

        let hashes: Vec<u32> = self.virtual_positions(id).collect();
        for hash in hashes {
            if let Err(index) = self.positions.binary_search(&hash) {
                self.positions.insert(index, hash);
            }
            let claimants = self.claims.entry(hash).or_default();
            if claimants.last().map(String::as_str) != Some(id) {
                claimants.retain(|claimant| claimant != id);
                claimants.push(id.to_string());
            }
        }
        true
    }

    // == Remove Shard ==
    /// Withdraws every claim `id` holds. A position nobody else claims is
    /// removed; a contested one falls back to its latest remaining claimant.
    ///
    /// Returns false, leaving the ring untouched, if `id` was never added.
    pub fn remove_shard(&mut self, id: &str) -> bool {
        if !self.members.remove(id) {
            return false;
        }

        let hashes: Vec<u32> = self.virtual_positions(id).collect();
        for hash in hashes {
            let Some(claimants) = self.claims.get_mut(&hash) else {
                continue;
            };
            claimants.retain(|claimant| claimant != id);
            if !claimants.is_empty() {
                continue;
            }

            self.claims.remove(&hash);
            if let Ok(index) = self.positions.binary_search(&hash) {
                self.positions.remove(index);
            }
        }
        true
    }

    // == Locate ==
    /// Owning shard of `key`: first position at or after the key's hash,
    /// wrapping around past the largest position. `None` on an empty ring.
    pub fn locate(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }

        let hash = (self.hash_fn)(key.as_bytes());
        let mut index = self.positions.partition_point(|&p| p < hash);
        if index == self.positions.len() {
            index = 0;
        }

        self.claims
            .get(&self.positions[index])
            .and_then(|claimants| claimants.last())
            .map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Registered shard ids, sorted.
    pub fn shard_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.members.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn shard_count(&self) -> usize {
        self.members.len()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of positions `id` currently owns.
    pub fn owned_positions(&self, id: &str) -> usize {
        self.claims
            .values()
            .filter(|claimants| claimants.last().map(String::as_str) == Some(id))
            .count()
    }

    /// True when the position list is sorted, matches the claim map, and
    /// every claimant is a registered shard.
    pub fn is_consistent(&self) -> bool {
        self.positions.windows(2).all(|w| w[0] < w[1])
            && self.positions.len() == self.claims.len()
            && self.positions.iter().all(|p| {
                self.claims.get(p).is_some_and(|claimants| {
                    !claimants.is_empty() && claimants.iter().all(|c| self.members.contains(c))
                })
            })
    }
}
