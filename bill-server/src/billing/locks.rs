//! Per-bill async locks
//!
//! Read-modify-write operations on one bill run one at a time. Entries are
//! removed when the last holder releases, so the map only holds bills that
//! are currently being written.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<i64, Arc<Mutex<()>>>;

#[derive(Debug, Default, Clone)]
pub struct BillLocks {
    locks: Arc<LockMap>,
}

impl BillLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `bill_id`
    pub async fn acquire(&self, bill_id: i64) -> BillLockGuard {
        let mutex = self
            .locks
            .entry(bill_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        BillLockGuard {
            bill_id,
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }

    /// Number of bills with an active or pending holder
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Releases the bill lock on drop
pub struct BillLockGuard {
    bill_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl Drop for BillLockGuard {
    fn drop(&mut self) {
        // Release first so the count below only sees waiters and the map
        drop(self.guard.take());
        self.locks
            .remove_if(&self.bill_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
