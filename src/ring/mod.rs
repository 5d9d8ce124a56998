//! Ring Module
//!
//! Consistent-hash routing from keys to shard identifiers.

mod hash_ring;


pub use hash_ring::{default_hash, HashFn, HashRing};
