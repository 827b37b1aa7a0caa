use crate::errors::ServiceError;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Identifies one stock record. All writes to a record serialize on this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StockKey {
    pub company_id: Uuid,
    pub part_id: Uuid,
    pub location_id: Uuid,
}

impl StockKey {
    pub fn new(company_id: Uuid, part_id: Uuid, location_id: Uuid) -> Self {
        Self {
            company_id,
            part_id,
            location_id,
        }
    }

    /// Global acquisition order for multi-key operations: location first,
    /// so two transfers over the same pair of locations in opposite
    /// directions always lock in the same order.
    fn lock_order(&self) -> (Uuid, Uuid, Uuid) {
        (self.location_id, self.part_id, self.company_id)
    }
}

/// Per-key exclusive sections with a bounded wait.
///
/// A caller that cannot acquire the lock within the window fails with a
/// retryable `LockTimeout` rather than queueing indefinitely. Lock entries
/// are retained for the life of the process; the set is bounded by the
/// number of (company, part, location) keys ever touched.
pub struct StockLockManager {
    locks: DashMap<StockKey, Arc<Mutex<()>>>,
    wait_timeout: Duration,
}

impl StockLockManager {
    pub fn new(wait_timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            wait_timeout,
        }
    }

    fn entry(&self, key: StockKey) -> Arc<Mutex<()>> {
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquires the exclusive section for one stock record.
    pub async fn acquire(&self, key: StockKey) -> Result<OwnedMutexGuard<()>, ServiceError> {
        let lock = self.entry(key);
        tokio::time::timeout(self.wait_timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                ServiceError::LockTimeout(format!(
                    "part {} at location {}",
                    key.part_id, key.location_id
                ))
            })
    }

    /// Acquires two exclusive sections in the global lock order.
    /// Guards are returned matching the argument order.
    pub async fn acquire_pair(
        &self,
        first: StockKey,
        second: StockKey,
    ) -> Result<(OwnedMutexGuard<()>, OwnedMutexGuard<()>), ServiceError> {
        if first.lock_order() <= second.lock_order() {
            let a = self.acquire(first).await?;
            let b = self.acquire(second).await?;
            Ok((a, b))
        } else {
            let b = self.acquire(second).await?;
            let a = self.acquire(first).await?;
            Ok((a, b))
        }
    }
}
