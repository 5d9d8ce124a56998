//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for shard eviction.

use std::collections::HashMap;

// == Eviction Policy ==
/// Chooses which key a full shard gives up.
///
/// The store reports every insert, access and removal; the policy answers
/// with a victim when capacity runs out. Implementations must track exactly
/// the keys the store holds.
pub trait EvictionPolicy: Send + std::fmt::Debug {
    /// A new key was inserted.
    fn record_insert(&mut self, key: &str);
    /// An existing key was read or overwritten.
    fn record_access(&mut self, key: &str);
    /// A key left the store for any reason other than `evict`.
    fn remove(&mut self, key: &str);
    /// Picks and forgets the next victim. `None` when nothing is tracked.
    fn evict(&mut self) -> Option<String>;
    /// Whether `key` is tracked.
    fn contains(&self, key: &str) -> bool;
    /// Number of tracked keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct Links {
    /// Neighbour closer to the most recently used end
    newer: Option<String>,
    /// Neighbour closer to the least recently used end
    older: Option<String>,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys form a doubly linked list threaded through a HashMap, so touch,
/// removal and eviction are all O(1):
/// - `head` = Most recently used
/// - `tail` = Least recently used
#[derive(Debug, Default)]
pub struct LruTracker {
    links: HashMap<String, Links>,
    head: Option<String>,
    tail: Option<String>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as recently used (moves or inserts it at the head).
    pub fn touch(&mut self, key: &str) {
        if self.head.as_deref() == Some(key) {
            return;
        }
        self.unlink(key);
        self.push_front(key);
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    /// Keys from most to least recently used.
    pub fn order(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.links.len());
        let mut cursor = self.head.clone();
        while let Some(key) = cursor {
            cursor = self.links.get(&key).and_then(|l| l.older.clone());
            out.push(key);
        }
        out
    }

    fn push_front(&mut self, key: &str) {
        let old_head = self.head.replace(key.to_string());
        match &old_head {
            Some(h) => {
                if let Some(links) = self.links.get_mut(h) {
                    links.newer = Some(key.to_string());
                }
            }
            None => self.tail = Some(key.to_string()),
        }
        self.links.insert(
            key.to_string(),
            Links {
                newer: None,
                older: old_head,
            },
        );
    }

    /// Detaches `key` and patches its neighbours. Returns false if untracked.
    fn unlink(&mut self, key: &str) -> bool {
        let Some(Links { newer, older }) = self.links.remove(key) else {
            return false;
        };

        match &newer {
            Some(n) => {
                if let Some(links) = self.links.get_mut(n) {
                    links.older = older.clone();
                }
            }
            None => self.head = older.clone(),
        }
        match &older {
            Some(o) => {
                if let Some(links) = self.links.get_mut(o) {
                    links.newer = newer;
                }
            }
            None => self.tail = newer,
        }
        true
    }
}

impl EvictionPolicy for LruTracker {
    fn record_insert(&mut self, key: &str) {
        self.touch(key);
    }

    fn record_access(&mut self, key: &str) {
        self.touch(key);
    }

    fn remove(&mut self, key: &str) {
        self.unlink(key);
    }

    fn evict(&mut self) -> Option<String> {
        let oldest = self.tail.clone()?;
        self.unlink(&oldest);
        Some(oldest)
    }

    fn contains(&self, key: &str) -> bool {
        self.links.contains_key(key)
    }

    fn len(&self) -> usize {
        self.links.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_touch_new_key() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("key1"));
        assert_eq!(lru.order(), vec!["key3", "key2", "key1"]);
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");
        lru.touch("key1");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("key2"));
        assert_eq!(lru.order(), vec!["key1", "key3", "key2"]);
    }

    #[test]
    fn test_lru_evict_in_order() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");

        assert_eq!(lru.evict(), Some("key1".to_string()));
        assert_eq!(lru.evict(), Some("key2".to_string()));
        assert_eq!(lru.len(), 1);
        assert_eq!(lru.order(), vec!["key3"]);
    }

    #[test]
    fn test_lru_evict_empty() {
        let mut lru = LruTracker::new();
        assert_eq!(lru.evict(), None);
    }

    #[test]
    fn test_lru_remove_middle() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");

        lru.remove("key2");

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("key2"));
        assert_eq!(lru.order(), vec!["key3", "key1"]);
    }

    #[test]
    fn test_lru_remove_head_and_tail() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        lru.remove("c");
        assert_eq!(lru.order(), vec!["b", "a"]);

        lru.remove("a");
        assert_eq!(lru.order(), vec!["b"]);
        assert_eq!(lru.peek_oldest(), Some("b"));

        lru.remove("b");
        assert!(lru.is_empty());
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        // [c, b, a] -> [a, c, b] -> [c, a, b] -> [b, c, a]
        lru.touch("a");
        lru.touch("c");
        lru.touch("b");

        assert_eq!(lru.evict(), Some("a".to_string()));
        assert_eq!(lru.evict(), Some("c".to_string()));
        assert_eq!(lru.evict(), Some("b".to_string()));
    }

    #[test]
    fn test_lru_remove_nonexistent_key() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.remove("nonexistent");

        assert_eq!(lru.len(), 2);
        assert_eq!(lru.order(), vec!["key2", "key1"]);
    }

    #[test]
    fn test_lru_touch_same_key_multiple_times() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key1");
        lru.touch("key1");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict(), Some("key1".to_string()));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_policy_trait_object() {
        let mut policy: Box<dyn EvictionPolicy> = Box::new(LruTracker::new());

        policy.record_insert("k1");
        policy.record_insert("k2");
        policy.record_access("k1");

        assert_eq!(policy.evict(), Some("k2".to_string()));
        assert_eq!(policy.len(), 1);
    }
}
