//! Backing-store capability for the distributed lock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// A subscription to a lock key's release notifications.
#[async_trait]
pub trait ReleaseListener: Send {
    /// Waits for the next release notification on the subscribed key.
    async fn wait_released(&mut self) -> Result<()>;
}

/// The three key-value primitives the lock is built on.
///
/// Production backs this with Redis (`SET NX PX`, a compare-and-delete
/// script, pub/sub); tests use [`crate::InMemoryLockStore`]. The store is
/// always injected through constructors, never a process-wide singleton.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Atomically stores `token` under `key` with expiry `ttl` if the key is
    /// absent. Returns true if the key was written.
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool>;

    /// Atomically deletes `key` and publishes a release notification, but
    /// only if the stored value equals `token`. Returns true if the key was
    /// deleted; false means the lock had expired or is owned by another
    /// token and nothing was changed.
    async fn release_if_owned(&self, key: &str, token: &str) -> Result<bool>;

    /// Subscribes to release notifications for `key`.
    async fn subscribe(&self, key: &str) -> Result<Box<dyn ReleaseListener>>;
}

#[async_trait]
impl<T: LockStore + ?Sized> LockStore for Arc<T> {
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        (**self).try_acquire(key, token, ttl).await
    }

    async fn release_if_owned(&self, key: &str, token: &str) -> Result<bool> {
        (**self).release_if_owned(key, token).await
    }

    async fn subscribe(&self, key: &str) -> Result<Box<dyn ReleaseListener>> {
        (**self).subscribe(key).await
    }
}
