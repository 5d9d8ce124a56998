//! Key Lock Table
//!
//! Fixed array of lock stripes. A key always maps to the same stripe, so
//! operations on one key serialize while different keys rarely contend.
//! Memory stays bounded no matter how many distinct keys a shard has seen.

use parking_lot::{Mutex, MutexGuard};

#[derive(Debug)]
pub struct KeyLockTable {
    stripes: Box<[Mutex<()>]>,
}

impl KeyLockTable {
    /// Creates a table with `stripes` locks (at least one).
    pub fn new(stripes: usize) -> Self {
        let stripes = (0..stripes.max(1)).map(|_| Mutex::new(())).collect();
        Self { stripes }
    }

    /// Stripe index guarding `key`.
    pub fn stripe_of(&self, key: &str) -> usize {
        crc32fast::hash(key.as_bytes()) as usize % self.stripes.len()
    }

    /// Blocks until the key's stripe is free. Released when the guard drops.
    pub fn lock(&self, key: &str) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_of(key)].lock()
    }

    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }
}
