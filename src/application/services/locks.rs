//! Per-dispenser critical sections
//!
//! A status change reads the current state and writes the result back.
//! Holding the dispenser's lock for that whole sequence keeps two
//! concurrent requests from both passing the precondition check.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Default)]
pub struct DispenserLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl DispenserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`; released when the guard drops.
    pub async fn lock(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let mutex = self.locks.entry(id).or_default().clone();
        mutex.lock_owned().await
    }

    /// Drop the entry for `id` unless someone holds or awaits it.
    ///
    /// Called once a request learns the id names no dispenser, so lookups
    /// of unknown ids leave nothing behind.
    pub fn forget(&self, id: Uuid) {
        self.locks
            .remove_if(&id, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    /// Number of ids with a live entry
    pub fn tracked(&self) -> usize {
        self.locks.len()
    }
}
