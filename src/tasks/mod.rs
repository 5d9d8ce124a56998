//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the cache.
//!
//! # Tasks
//! - Staleness sweep: publishes invalidations for entries past the threshold
//! - Invalidation listener: one per shard, applies messages from its topic

mod listener;
mod sweep;

pub use listener::spawn_invalidation_listener;
pub use sweep::spawn_sweep_task;
