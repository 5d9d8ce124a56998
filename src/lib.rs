//! Shard Cache - A sharded in-process key-value cache
//!
//! Routes keys to LRU shards over a consistent-hash ring and removes stale
//! entries through an asynchronous invalidation bus.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod pubsub;
pub mod ring;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::Invalidation;
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use manager::CacheManager;
pub use pubsub::PubSub;
pub use ring::HashRing;
