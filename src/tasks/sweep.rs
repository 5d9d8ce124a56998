//! Staleness Sweep Task
//!
//! Background task that periodically looks for entries older than the
//! staleness threshold and publishes their invalidation.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::manager::CacheManager;

/// Spawns the recurring sweep for `manager`.
///
/// The task sleeps for `interval` between cycles. Each cycle is read-only on
/// the shards: removal happens later in each shard's invalidation listener.
/// The task ends when `shutdown` is cancelled or the manager is dropped.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(Arc::downgrade(&manager), Duration::from_secs(10), token.clone());
/// // Later, during shutdown:
/// token.cancel();
/// handle.await?;
/// ```
pub fn spawn_sweep_task(
    manager: Weak<CacheManager>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting staleness sweep task with interval of {:?}",
            interval
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let Some(manager) = manager.upgrade() else {
                break;
            };

            let published = manager.sweep();
            if published > 0 {
                info!("Staleness sweep: published {} invalidations", published);
            } else {
                debug!("Staleness sweep: no stale entries found");
            }
        }

        info!("Staleness sweep task stopped");
    })
}
