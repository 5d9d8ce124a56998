//! Manager-wide statistics snapshot.

use serde::Serialize;

use crate::cache::CacheStats;

/// Counters of one shard at the time of the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ShardStats {
    pub id: String,
    pub capacity: usize,
    #[serde(flatten)]
    pub cache: CacheStats,
    pub hit_rate: f64,
    /// Invalidations queued for this shard but not yet applied
    pub backlog: usize,
}

/// Per-shard counters plus their sum.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStats {
    pub shards: Vec<ShardStats>,
    pub totals: CacheStats,
    pub hit_rate: f64,
    /// Invalidations lost to full subscriber queues since startup
    pub dropped_invalidations: u64,
}

impl ManagerStats {
    /// Builds the snapshot from per-shard entries, sorted by shard id.
    pub fn from_shards(mut shards: Vec<ShardStats>, dropped_invalidations: u64) -> Self {
        shards.sort_by(|a, b| a.id.cmp(&b.id));

        let mut totals = CacheStats::new();
        for shard in &shards {
            totals.merge(&shard.cache);
        }

        Self {
            hit_rate: totals.hit_rate(),
            shards,
            totals,
            dropped_invalidations,
        }
    }
}
