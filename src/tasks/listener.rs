//! Invalidation Listener Task
//!
//! Drains one shard's invalidation topic and applies each message in order.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::{Invalidation, Shard};
use crate::pubsub::Subscription;

/// Spawns the consumer of `subscription` for `shard`.
///
/// Messages are handled one at a time in delivery order. The task stops
/// when `shutdown` is cancelled or the bus side of the channel goes away;
/// a message already taken off the queue is always applied before exiting.
pub fn spawn_invalidation_listener(
    shard: Arc<Shard>,
    mut subscription: Subscription<Invalidation>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(shard = %shard.id(), topic = %subscription.topic(), "Starting invalidation listener");

        loop {
            let message = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                message = subscription.recv() => message,
            };

            let Some(invalidation) = message else {
                break;
            };

            let removed = shard.handle_invalidation(&invalidation);
            debug!(shard = %shard.id(), ?invalidation, removed, "Applied invalidation");
        }

        info!(shard = %shard.id(), "Invalidation listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::PubSub;
    use std::time::Duration;

    async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
        for _ in 0..100 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    #[tokio::test]
    async fn test_listener_applies_published_invalidation() {
        let bus = PubSub::new(16);
        let shard = Arc::new(Shard::new("node1", 5, 8));
        let token = CancellationToken::new();
        let handle = spawn_invalidation_listener(
            Arc::clone(&shard),
            bus.subscribe(shard.topic()),
            token.clone(),
        );

        shard.set("key1".to_string(), "value1".to_string());
        shard.set("key2".to_string(), "value2".to_string());

        bus.publish(shard.topic(), Invalidation::Key("key1".to_string()));

        assert!(wait_until(|| shard.peek("key1").is_none()).await);
        assert_eq!(shard.get("key2"), Some("value2".to_string()));

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_listener_value_invalidation() {
        let bus = PubSub::new(16);
        let shard = Arc::new(Shard::new("node1", 5, 8));
        let token = CancellationToken::new();
        let handle = spawn_invalidation_listener(
            Arc::clone(&shard),
            bus.subscribe(shard.topic()),
            token.clone(),
        );

        shard.set("key1".to_string(), "value1".to_string());
        bus.publish(shard.topic(), Invalidation::Value("value1".to_string()));

        assert!(wait_until(|| shard.is_empty()).await);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_listener_stops_on_cancel() {
        let bus: PubSub<Invalidation> = PubSub::new(16);
        let shard = Arc::new(Shard::new("node1", 5, 8));
        let token = CancellationToken::new();
        let handle = spawn_invalidation_listener(shard, bus.subscribe("evict-node1"), token.clone());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("listener should stop after cancel")
            .unwrap();
        assert_eq!(bus.subscriber_count("evict-node1"), 0);
    }

    #[tokio::test]
    async fn test_listener_ignores_other_topics() {
        let bus = PubSub::new(16);
        let shard = Arc::new(Shard::new("node1", 5, 8));
        let token = CancellationToken::new();
        let handle = spawn_invalidation_listener(
            Arc::clone(&shard),
            bus.subscribe(shard.topic()),
            token.clone(),
        );

        shard.set("key1".to_string(), "value1".to_string());
        bus.publish("evict-node2", Invalidation::Key("key1".to_string()));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(shard.get("key1"), Some("value1".to_string()));

        token.cancel();
        handle.await.unwrap();
    }
}
