//! Manager Module
//!
//! Owns the ring, the shards and the invalidation bus, and routes every
//! request to the shard that owns its key.

mod coordinator;
mod stats;

pub use coordinator::CacheManager;
pub use stats::{ManagerStats, ShardStats};
