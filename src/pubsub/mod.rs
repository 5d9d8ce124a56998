//! Pub/Sub Module
//!
//! In-process publish/subscribe bus used to deliver invalidations to shards.

mod bus;

pub use bus::{PubSub, PublishOutcome, Subscription, DEFAULT_BUFFER};
