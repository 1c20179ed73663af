//! Per-record async locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use filegate_shared::FileId;

/// One async mutex per file id, created on demand.
///
/// Entries are dropped again by [`KeyedLocks::release`] once no other task
/// holds or waits on them.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    locks: DashMap<FileId, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub(crate) async fn lock(&self, id: FileId) -> OwnedMutexGuard<()> {
        // The map shard guard must be gone before awaiting.
        let mutex = Arc::clone(self.locks.entry(id).or_default().value());
        mutex.lock_owned().await
    }

    /// Drop the entry for `id` if nobody else references it.
    ///
    /// Call after the guard from [`KeyedLocks::lock`] has been dropped.
    pub(crate) fn release(&self, id: FileId) {
        self.locks
            .remove_if(&id, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}
