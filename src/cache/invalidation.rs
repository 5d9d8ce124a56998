//! Invalidation Messages
//!
//! Tagged payloads carried on a shard's invalidation topic.

use tokio::time::Instant;

use crate::cache::CacheEntry;

// == Invalidation ==
/// Describes which entries a shard should drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Remove the entry stored under this key
    Key(String),
    /// Remove every entry whose current value equals this one
    Value(String),
    /// Remove the key only if it was not rewritten after `written_at`
    StaleKey {
        key: String,
        written_at: Instant,
    },
}

impl Invalidation {
    /// Whether `entry` matches this invalidation.
    pub fn matches(&self, entry: &CacheEntry) -> bool {
        match self {
            Invalidation::Key(key) => entry.key == *key,
            Invalidation::Value(value) => entry.value == *value,
            Invalidation::StaleKey { key, written_at } => {
                entry.key == *key && entry.last_written <= *written_at
            }
        }
    }
}
