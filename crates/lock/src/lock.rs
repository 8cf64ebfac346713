//! Lock acquisition and release.

use std::time::Duration;

use uuid::Uuid;

use crate::error::{LockError, Result};
use crate::store::LockStore;

/// A held lock: the key it guards and the owner token that must match at
/// release time. Exists only in the backing store, never in the system of
/// record.
#[derive(Debug, Clone)]
pub struct Lock {
    key: String,
    token: String,
    ttl: Duration,
}

impl Lock {
    /// Returns the lock key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the owner token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the TTL the lock was acquired with.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// The mutual-exclusion primitive.
///
/// Serializes access to a named resource across processes sharing the same
/// backing store. Callers must size `ttl` comfortably above the expected
/// critical-section duration; the TTL is what keeps a crashed holder from
/// leaking the lock forever.
pub struct DistributedLock<S: LockStore> {
    store: S,
}

impl<S: LockStore> DistributedLock<S> {
    /// Creates a new lock primitive over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Acquires the lock under `key`, waiting up to `timeout`.
    ///
    /// The fast path is a single set-if-absent attempt. On contention the
    /// caller subscribes to the key's release channel and re-attempts on
    /// each notification; no release within `timeout` fails closed with
    /// [`LockError::Timeout`].
    #[tracing::instrument(skip(self))]
    pub async fn acquire(&self, key: &str, ttl: Duration, timeout: Duration) -> Result<Lock> {
        let token = Uuid::new_v4().to_string();

        if self.store.try_acquire(key, &token, ttl).await? {
            return Ok(self.held(key, token, ttl));
        }

        let mut listener = self.store.subscribe(key).await?;
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            // Re-attempt after subscribing: the holder may have released
            // between the failed fast path and the subscription.
            if self.store.try_acquire(key, &token, ttl).await? {
                return Ok(self.held(key, token, ttl));
            }

            match tokio::time::timeout_at(deadline, listener.wait_released()).await {
                Ok(released) => released?,
                Err(_) => {
                    tracing::debug!(key, ?timeout, "gave up waiting for lock");
                    return Err(LockError::Timeout {
                        key: key.to_string(),
                        waited: timeout,
                    });
                }
            }
        }
    }

    /// Releases a held lock.
    ///
    /// The store deletes the key only if it still holds this owner's token;
    /// if the lock expired and was taken over by another owner in the
    /// meantime, the call is a no-op with a warning. Releasing twice is
    /// therefore safe.
    pub async fn release(&self, lock: &Lock) -> Result<()> {
        if !self.store.release_if_owned(&lock.key, &lock.token).await? {
            tracing::warn!(
                key = %lock.key,
                "lock was no longer held by this owner at release"
            );
        }
        Ok(())
    }

    fn held(&self, key: &str, token: String, ttl: Duration) -> Lock {
        tracing::debug!(key, "lock acquired");
        Lock {
            key: key.to_string(),
            token,
            ttl,
        }
    }
}
