//! Topic-based fan-out bus.
//!
//! Every subscription owns a bounded queue. Publishing never waits: a full
//! queue drops the message for that subscriber only, a closed queue is
//! skipped. Delivery is therefore at-most-once, and per-subscriber order
//! follows the order of `publish` calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Default queue depth of a subscription.
pub const DEFAULT_BUFFER: usize = 1024;

// == Publish Outcome ==
/// What happened to one published message across the topic's subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    /// Subscribers the message was queued for
    pub delivered: usize,
    /// Subscribers whose queue was full
    pub dropped: usize,
    /// Subscribers that stopped listening
    pub closed: usize,
}

impl PublishOutcome {
    pub fn merge(&mut self, other: PublishOutcome) {
        self.delivered += other.delivered;
        self.dropped += other.dropped;
        self.closed += other.closed;
    }
}

// == Subscription ==
/// Receiving end of one topic registration.
#[derive(Debug)]
pub struct Subscription<M> {
    topic: String,
    receiver: mpsc::Receiver<M>,
}

impl<M> Subscription<M> {
    /// Waits for the next message. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }

    /// Takes a queued message without waiting.
    pub fn try_recv(&mut self) -> Option<M> {
        self.receiver.try_recv().ok()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

// == PubSub ==
/// Fan-out bus keyed by topic name. Assigns no meaning to messages.
#[derive(Debug)]
pub struct PubSub<M> {
    topics: RwLock<HashMap<String, Vec<mpsc::Sender<M>>>>,
    buffer: usize,
    dropped: AtomicU64,
}

impl<M: Clone + Send + 'static> Default for PubSub<M> {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER)
    }
}

impl<M: Clone + Send + 'static> PubSub<M> {
    /// Creates a bus whose subscriptions each queue up to `buffer` messages.
    pub fn new(buffer: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    // == Subscribe ==
    /// Registers a new subscription on `topic`. Past messages are not replayed.
    pub fn subscribe(&self, topic: &str) -> Subscription<M> {
        let (sender, receiver) = mpsc::channel(self.buffer);
        self.topics
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(sender);

        debug!(topic, "New subscription registered");
        Subscription {
            topic: topic.to_string(),
            receiver,
        }
    }

    // == Publish ==
    /// Queues `message` for every subscriber of `topic` without blocking.
    ///
    /// A topic nobody listens to yields an all-zero outcome.
    pub fn publish(&self, topic: &str, message: M) -> PublishOutcome {
        let topics = self.topics.read();
        let mut outcome = PublishOutcome::default();

        let Some(subscribers) = topics.get(topic) else {
            return outcome;
        };

        for sender in subscribers {
            match sender.try_send(message.clone()) {
                Ok(()) => outcome.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    outcome.dropped += 1;
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(topic, "Subscriber queue full, message dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    outcome.closed += 1;
                    debug!(topic, "Skipping closed subscriber");
                }
            }
        }

        outcome
    }

    // == Backlog ==
    /// Messages queued on `topic` that live subscribers have not consumed yet.
    pub fn backlog(&self, topic: &str) -> usize {
        self.topics
            .read()
            .get(topic)
            .map(|subscribers| {
                subscribers
                    .iter()
                    .filter(|s| !s.is_closed())
                    .map(|s| s.max_capacity() - s.capacity())
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Live subscribers of `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .get(topic)
            .map(|subscribers| subscribers.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }

    /// Total messages dropped on full queues since the bus was created.
    pub fn dropped_total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.read().keys().cloned().collect()
    }
}
