//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::manager::{ManagerStats, ShardStats};

/// Response body of `GET /cache/get`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: String,
    /// Shard that served the read
    pub shard: String,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: impl Into<String>, shard: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            shard: shard.into(),
        }
    }
}

/// Response body of `PUT|POST /cache/set`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    pub key: String,
    /// Shard that stored the entry
    pub shard: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, shard: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            shard: shard.into(),
        }
    }
}

/// Response body of `DELETE /cache/invalidate`
///
/// Removal is asynchronous, so this only reports how many shard listeners
/// received the request.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub delivered: usize,
    pub dropped: usize,
}

impl InvalidateResponse {
    pub fn new(target: &str, delivered: usize, dropped: usize) -> Self {
        Self {
            message: format!("Invalidation of {} scheduled", target),
            delivered,
            dropped,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub totals: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub shard_count: usize,
    pub dropped_invalidations: u64,
    pub shards: Vec<ShardStats>,
}

impl From<ManagerStats> for StatsResponse {
    fn from(stats: ManagerStats) -> Self {
        Self {
            hit_rate: stats.hit_rate,
            shard_count: stats.shards.len(),
            totals: stats.totals,
            dropped_invalidations: stats.dropped_invalidations,
            shards: stats.shards,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub shards: usize,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(shards: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            shards,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
