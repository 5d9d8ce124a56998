//! Cache Coordinator
//!
//! Routes keys to shards through the hash ring, owns the invalidation bus and
//! supervises the background tasks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{Invalidation, Shard, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::manager::{ManagerStats, ShardStats};
use crate::pubsub::{PubSub, PublishOutcome};
use crate::ring::HashRing;
use crate::tasks::{spawn_invalidation_listener, spawn_sweep_task};

/// A registered shard and its invalidation listener.
#[derive(Debug)]
struct ShardHandle {
    shard: Arc<Shard>,
    listener: CancellationToken,
    listener_task: Option<JoinHandle<()>>,
}

/// Ring and shard table, always changed together.
#[derive(Debug)]
struct Topology {
    ring: HashRing,
    shards: HashMap<String, ShardHandle>,
}

// == Cache Manager ==
/// Sharded cache front door.
///
/// `get` and `set` hold the topology read lock for the duration of the shard
/// call. Readers share it, so requests never contend with each other, but a
/// membership change waits for in-flight calls and no call can reach a shard
/// that has already left the ring.
///
/// Every shard only holds keys the ring currently routes to it: `add_shard`
/// drops the entries that move to the new shard before it goes live.
#[derive(Debug)]
pub struct CacheManager {
    config: CacheConfig,
    topology: RwLock<Topology>,
    bus: PubSub<Invalidation>,
    token: CancellationToken,
    sweep_task: Mutex<Option<JoinHandle<()>>>,
}

impl CacheManager {
    // == Start ==
    /// Builds `shard_count` shards named `node-{i}` and spawns their
    /// listeners, plus the sweep task when a staleness threshold is set.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: CacheConfig) -> Result<Arc<Self>> {
        config.validate()?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CacheError::Internal(
                "cache manager must be started inside a Tokio runtime".to_string(),
            ));
        }

        let manager = Arc::new(Self {
            topology: RwLock::new(Topology {
                ring: HashRing::new(config.ring_replicas),
                shards: HashMap::new(),
            }),
            bus: PubSub::new(config.bus_buffer),
            token: CancellationToken::new(),
            sweep_task: Mutex::new(None),
            config,
        });

        for i in 0..manager.config.shard_count {
            manager.add_shard(&format!("node-{}", i))?;
        }

        if manager.config.sweep_enabled() {
            let handle = spawn_sweep_task(
                Arc::downgrade(&manager),
                manager.config.sweep_interval,
                manager.token.child_token(),
            );
            *manager.sweep_task.lock() = Some(handle);
        } else {
            info!("Staleness threshold is zero, sweep disabled");
        }

        info!(
            "Cache manager started: shards={}, capacity={}, staleness={:?}",
            manager.config.shard_count,
            manager.config.shard_capacity,
            manager.config.staleness_threshold
        );
        Ok(manager)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn bus(&self) -> &PubSub<Invalidation> {
        &self.bus
    }

    // == Routing ==
    fn owner<'a>(topology: &'a Topology, key: &str) -> Result<&'a Shard> {
        let id = topology.ring.locate(key).ok_or(CacheError::EmptyRing)?;

        topology
            .shards
            .get(id)
            .map(|handle| handle.shard.as_ref())
            .ok_or_else(|| CacheError::Internal(format!("ring routed to unknown shard {}", id)))
    }

    /// Runs `f` on the owner of `key` while holding the topology read lock.
    fn with_owner<R>(&self, key: &str, f: impl FnOnce(&Shard) -> R) -> Result<R> {
        let topology = self.topology.read();
        Ok(f(Self::owner(&topology, key)?))
    }

    /// Id of the shard currently owning `key`.
    pub fn locate(&self, key: &str) -> Result<String> {
        self.with_owner(key, |shard| shard.id().to_string())
    }

    /// Registered shard, if any.
    pub fn shard(&self, id: &str) -> Option<Arc<Shard>> {
        self.topology
            .read()
            .shards
            .get(id)
            .map(|handle| Arc::clone(&handle.shard))
    }

    /// Registered shard ids, sorted.
    pub fn shard_ids(&self) -> Vec<String> {
        self.topology.read().ring.shard_ids()
    }

    pub fn shard_count(&self) -> usize {
        self.topology.read().shards.len()
    }

    // == Get ==
    /// Value under `key`, or `None` when absent.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_owner(key, |shard| shard.get(key))
    }

    /// Like [`get`](Self::get), also returning the id of the shard that served it.
    pub fn get_with_owner(&self, key: &str) -> Result<(String, Option<String>)> {
        self.with_owner(key, |shard| (shard.id().to_string(), shard.get(key)))
    }

    // == Set ==
    /// Writes `value` under `key` on the owning shard.
    pub fn set(&self, key: String, value: String) -> Result<()> {
        self.set_with_owner(key, value).map(|_| ())
    }

    /// Like [`set`](Self::set), returning the id of the shard that stored it.
    pub fn set_with_owner(&self, key: String, value: String) -> Result<String> {
        validate_entry(&key, &value)?;
        let topology = self.topology.read();
        let shard = Self::owner(&topology, &key)?;
        shard.set(key, value);
        Ok(shard.id().to_string())
    }

    // == Sweep ==
    /// Runs one staleness pass and returns the number of invalidations
    /// published.
    ///
    /// The pass never mutates a shard. Each stale entry is announced on its
    /// shard's topic together with the write time the pass observed, so an
    /// entry rewritten in the meantime is left alone by the listener.
    pub fn sweep(&self) -> usize {
        let threshold = self.config.staleness_threshold;
        if threshold.is_zero() {
            return 0;
        }

        let shards: Vec<Arc<Shard>> = self
            .topology
            .read()
            .shards
            .values()
            .map(|handle| Arc::clone(&handle.shard))
            .collect();

        let now = Instant::now();
        let mut published = 0;
        for shard in shards {
            for (key, written_at) in shard.stale_entries(now, threshold) {
                debug!(shard = %shard.id(), key = %key, "Publishing stale entry invalidation");
                self.bus
                    .publish(shard.topic(), Invalidation::StaleKey { key, written_at });
                published += 1;
            }
        }

        published
    }

    // == Explicit Invalidation ==
    /// Asks the owning shard to drop `key`. Removal happens asynchronously.
    pub fn invalidate_key(&self, key: &str) -> Result<PublishOutcome> {
        let topic = self.with_owner(key, |shard| shard.topic().to_string())?;
        Ok(self
            .bus
            .publish(&topic, Invalidation::Key(key.to_string())))
    }

    /// Asks every shard to drop the entries currently holding `value`.
    pub fn invalidate_value(&self, value: &str) -> PublishOutcome {
        let topics: Vec<String> = self
            .topology
            .read()
            .shards
            .values()
            .map(|handle| handle.shard.topic().to_string())
            .collect();

        let mut outcome = PublishOutcome::default();
        for topic in topics {
            outcome.merge(
                self.bus
                    .publish(&topic, Invalidation::Value(value.to_string())),
            );
        }
        outcome
    }

    // == Membership ==
    /// Adds a shard to the ring and starts its listener.
    ///
    /// Returns `Ok(false)` when `id` is already registered. Keys that now
    /// route to the new shard start cold: their entries on the previous
    /// owners are dropped before the new shard serves requests.
    pub fn add_shard(&self, id: &str) -> Result<bool> {
        if id.is_empty() {
            return Err(CacheError::InvalidRequest(
                "Shard id cannot be empty".to_string(),
            ));
        }

        let mut topology = self.topology.write();
        if topology.shards.contains_key(id) {
            return Ok(false);
        }

        let shard = Arc::new(Shard::new(
            id,
            self.config.shard_capacity,
            self.config.lock_stripes,
        ));
        let listener = self.token.child_token();
        let subscription = self.bus.subscribe(shard.topic());
        let listener_task =
            spawn_invalidation_listener(Arc::clone(&shard), subscription, listener.clone());

        topology.ring.add_shard(id);

        // Requests are blocked on the write lock, so nothing can re-insert a
        // moved key into its previous owner while this runs.
        let ring = &topology.ring;
        let moved: usize = topology
            .shards
            .values()
            .map(|handle| handle.shard.retain_keys(|key| ring.locate(key) != Some(id)))
            .sum();

        topology.shards.insert(
            id.to_string(),
            ShardHandle {
                shard,
                listener,
                listener_task: Some(listener_task),
            },
        );
        drop(topology);

        info!(shard = %id, moved, "Shard added");
        Ok(true)
    }

    /// Removes a shard from the ring and stops its listener. Its entries
    /// are dropped with it.
    ///
    /// Returns `Ok(false)` for an unknown id. The last shard cannot be
    /// removed.
    pub fn remove_shard(&self, id: &str) -> Result<bool> {
        let mut topology = self.topology.write();
        if !topology.shards.contains_key(id) {
            return Ok(false);
        }
        if topology.shards.len() == 1 {
            return Err(CacheError::InvalidConfiguration(
                "cannot remove the last shard".to_string(),
            ));
        }

        topology.ring.remove_shard(id);
        let handle = topology.shards.remove(id);
        drop(topology);

        // Dropping the join handle detaches the listener; it exits once cancelled
        if let Some(handle) = handle {
            handle.listener.cancel();
        }

        info!(shard = %id, "Shard removed");
        Ok(true)
    }

    // == Stats ==
    pub fn stats(&self) -> ManagerStats {
        let shards: Vec<Arc<Shard>> = self
            .topology
            .read()
            .shards
            .values()
            .map(|handle| Arc::clone(&handle.shard))
            .collect();

        let entries = shards
            .iter()
            .map(|shard| {
                let cache = shard.stats();
                ShardStats {
                    id: shard.id().to_string(),
                    capacity: shard.capacity(),
                    hit_rate: cache.hit_rate(),
                    cache,
                    backlog: self.bus.backlog(shard.topic()),
                }
            })
            .collect();

        ManagerStats::from_shards(entries, self.bus.dropped_total())
    }

    // == Shutdown ==
    /// Stops the sweep and every listener, then waits for them to finish.
    pub async fn shutdown(&self) {
        self.token.cancel();

        let mut handles: Vec<JoinHandle<()>> = self
            .topology
            .write()
            .shards
            .values_mut()
            .filter_map(|handle| handle.listener_task.take())
            .collect();
        handles.extend(self.sweep_task.lock().take());

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background task ended abnormally");
            }
        }

        info!("Cache manager stopped");
    }

    pub fn is_shut_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Background tasks whose handle is still held.
    #[cfg(test)]
    fn tracked_task_count(&self) -> usize {
        let listeners = self
            .topology
            .read()
            .shards
            .values()
            .filter(|handle| handle.listener_task.is_some())
            .count();
        listeners + usize::from(self.sweep_task.lock().is_some())
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Rejects keys and values the cache refuses to store.
fn validate_entry(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if value.is_empty() {
        return Err(CacheError::InvalidRequest(
            "Value cannot be empty".to_string(),
        ));
    }
    if value.len() > MAX_VALUE_SIZE {
        return Err(CacheError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}
