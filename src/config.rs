//! Configuration Module
//!
//! Handles loading and validating cache and server configuration from
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Tunables of the cache core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of shards built at startup
    pub shard_count: usize,
    /// Maximum number of entries held by each shard
    pub shard_capacity: usize,
    /// Maximum age since last write before an entry is invalidated.
    /// Zero disables the sweep.
    pub staleness_threshold: Duration,
    /// Virtual ring positions per shard
    pub ring_replicas: usize,
    /// Delay between two sweep cycles
    pub sweep_interval: Duration,
    /// Number of key-lock stripes per shard
    pub lock_stripes: usize,
    /// Queue depth of every bus subscription
    pub bus_buffer: usize,
}

impl CacheConfig {
    /// Rejects settings the cache cannot start with.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.shard_count, "shard_count"),
            (self.shard_capacity, "shard_capacity"),
            (self.ring_replicas, "ring_replicas"),
            (self.lock_stripes, "lock_stripes"),
            (self.bus_buffer, "bus_buffer"),
        ];

        for (value, name) in checks {
            if value == 0 {
                return Err(CacheError::InvalidConfiguration(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }

        if self.sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfiguration(
                "sweep_interval must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns true when the periodic staleness sweep should run.
    pub fn sweep_enabled(&self) -> bool {
        !self.staleness_threshold.is_zero()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shard_count: 3,
            shard_capacity: 1000,
            staleness_threshold: Duration::from_secs(60),
            ring_replicas: 50,
            sweep_interval: Duration::from_secs(10),
            lock_stripes: 64,
            bus_buffer: 1024,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Cache core settings
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SHARD_COUNT` - Number of shards (default: 3)
    /// - `SHARD_CAPACITY` - Entries per shard (default: 1000)
    /// - `STALENESS_THRESHOLD` - Max entry age in seconds, 0 disables (default: 60)
    /// - `RING_REPLICAS` - Virtual nodes per shard (default: 50)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 10)
    /// - `LOCK_STRIPES` - Key-lock stripes per shard (default: 64)
    /// - `BUS_BUFFER` - Queue depth per subscription (default: 1024)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    pub fn from_env() -> Self {
        let defaults = CacheConfig::default();

        Self {
            cache: CacheConfig {
                shard_count: env_or("SHARD_COUNT", defaults.shard_count),
                shard_capacity: env_or("SHARD_CAPACITY", defaults.shard_capacity),
                staleness_threshold: Duration::from_secs(env_or(
                    "STALENESS_THRESHOLD",
                    defaults.staleness_threshold.as_secs(),
                )),
                ring_replicas: env_or("RING_REPLICAS", defaults.ring_replicas),
                sweep_interval: Duration::from_secs(env_or(
                    "SWEEP_INTERVAL",
                    defaults.sweep_interval.as_secs(),
                )),
                lock_stripes: env_or("LOCK_STRIPES", defaults.lock_stripes),
                bus_buffer: env_or("BUS_BUFFER", defaults.bus_buffer),
            },
            server_port: env_or("SERVER_PORT", 8080),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
