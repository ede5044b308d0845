//! Per-forest serialization of batch handling
//!
//! Batches for different forests are handled concurrently. Batches for the
//! same forest take the forest's lock so that the completion check and the
//! link pass run once per forest at a time.

use crate::types::ForestId;
use parking_lot::Mutex as MapMutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

struct LockEntry {
    lock: Arc<Mutex<()>>,
    /// Live `ForestLock` handles for this forest
    users: usize,
}

/// Per-forest lock manager
///
/// Entries are counted per handle and removed when the last handle drops, so
/// a cancelled waiter never leaves its entry behind.
pub struct ForestLockManager {
    locks: MapMutex<HashMap<ForestId, LockEntry>>,
}

/// Handle on one forest's lock. Dropping it releases the manager entry.
pub struct ForestLock<'a> {
    manager: &'a ForestLockManager,
    forest_id: ForestId,
    lock: Arc<Mutex<()>>,
}

impl ForestLockManager {
    pub fn new() -> Self {
        Self {
            locks: MapMutex::new(HashMap::new()),
        }
    }

    /// Get a handle on the lock for a forest, creating it if needed.
    pub fn handle(&self, forest_id: ForestId) -> ForestLock<'_> {
        let mut map = self.locks.lock();
        let entry = map.entry(forest_id).or_insert_with(|| LockEntry {
            lock: Arc::new(Mutex::new(())),
            users: 0,
        });
        entry.users += 1;
        ForestLock {
            manager: self,
            forest_id,
            lock: Arc::clone(&entry.lock),
        }
    }

    fn release(&self, forest_id: ForestId) {
        let mut map = self.locks.lock();
        if let Some(entry) = map.get_mut(&forest_id) {
            entry.users = entry.users.saturating_sub(1);
            if entry.users == 0 {
                map.remove(&forest_id);
            }
        }
    }

    pub fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Default for ForestLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ForestLock<'_> {
    /// Wait for exclusive access to the forest.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    pub fn same_lock(&self, other: &ForestLock<'_>) -> bool {
        Arc::ptr_eq(&self.lock, &other.lock)
    }
}

impl Drop for ForestLock<'_> {
    fn drop(&mut self) {
        self.manager.release(self.forest_id);
    }
}
