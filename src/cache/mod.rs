//! Cache Module
//!
//! Per-shard storage: bounded LRU stores, key-lock striping and the
//! invalidation payloads shards consume.

mod entry;
mod invalidation;
mod locks;
mod lru;
mod shard;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use invalidation::Invalidation;
pub use locks::KeyLockTable;
pub use lru::{EvictionPolicy, LruTracker};
pub use shard::Shard;
pub use stats::CacheStats;
pub use store::ShardStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
