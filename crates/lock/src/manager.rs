//! Scoped lock execution.

use std::future::Future;
use std::time::Duration;

use crate::error::LockError;
use crate::lock::DistributedLock;
use crate::store::LockStore;

/// Default TTL for locks taken through the manager. Sized well above the
/// expected critical-section duration of a checkout step.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3);

/// Default wall-clock budget for waiting on a contended lock.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(3);

/// Runs caller logic under a held lock with guaranteed release.
///
/// The body manages its own transactional boundary; the manager only
/// guarantees that the lock is released whether the body succeeds or fails.
pub struct LockManager<S: LockStore> {
    lock: DistributedLock<S>,
    ttl: Duration,
    wait: Duration,
}

impl<S: LockStore> LockManager<S> {
    /// Creates a manager with the default TTL and wait timeout.
    pub fn new(store: S) -> Self {
        Self::with_timings(store, DEFAULT_TTL, DEFAULT_WAIT)
    }

    /// Creates a manager with explicit TTL and wait timeout.
    pub fn with_timings(store: S, ttl: Duration, wait: Duration) -> Self {
        Self {
            lock: DistributedLock::new(store),
            ttl,
            wait,
        }
    }

    /// Acquires the lock under `key`, runs `body`, and releases the lock
    /// regardless of the body's outcome.
    ///
    /// A release failure after a completed body does not override the body's
    /// result; the lock's TTL bounds the damage and the failure is logged.
    pub async fn run_exclusive<F, Fut, T, E>(&self, key: &str, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<LockError>,
    {
        let held = self.lock.acquire(key, self.ttl, self.wait).await?;

        let result = body().await;

        if let Err(e) = self.lock.release(&held).await {
            tracing::warn!(key, error = %e, "failed to release lock after exclusive section");
        }

        result
    }
}
