//! In-memory lock store implementation for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};
use tokio::time::Instant;

use crate::error::{LockError, Result};
use crate::store::{LockStore, ReleaseListener};

const RELEASE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
struct Held {
    token: String,
    expires_at: Instant,
}

#[derive(Default)]
struct Inner {
    held: HashMap<String, Held>,
    channels: HashMap<String, broadcast::Sender<()>>,
}

impl Inner {
    /// Drops the entry for `key` if its TTL has elapsed. Expiry is lazy:
    /// an expired entry is indistinguishable from an absent one.
    fn purge_expired(&mut self, key: &str) {
        if let Some(held) = self.held.get(key)
            && held.expires_at <= Instant::now()
        {
            self.held.remove(key);
        }
    }

    fn channel(&mut self, key: &str) -> broadcast::Sender<()> {
        self.channels
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(RELEASE_CHANNEL_CAPACITY).0)
            .clone()
    }
}

/// In-memory lock store implementation.
///
/// Provides the same set-if-absent / compare-and-delete / subscribe
/// semantics as the Redis-backed store, keyed on a process-local map.
#[derive(Clone, Default)]
pub struct InMemoryLockStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryLockStore {
    /// Creates a new empty in-memory lock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `key` is currently held (and not expired).
    pub async fn is_held(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().await;
        inner.purge_expired(key);
        inner.held.contains_key(key)
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        inner.purge_expired(key);

        if inner.held.contains_key(key) {
            return Ok(false);
        }

        inner.held.insert(
            key.to_string(),
            Held {
                token: token.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(true)
    }

    async fn release_if_owned(&self, key: &str, token: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        inner.purge_expired(key);

        match inner.held.get(key) {
            Some(held) if held.token == token => {
                inner.held.remove(key);
                // No receivers is fine; nobody was waiting.
                let _ = inner.channel(key).send(());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn subscribe(&self, key: &str) -> Result<Box<dyn ReleaseListener>> {
        let mut inner = self.inner.lock().await;
        let rx = inner.channel(key).subscribe();
        Ok(Box::new(BroadcastListener {
            key: key.to_string(),
            rx,
        }))
    }
}

struct BroadcastListener {
    key: String,
    rx: broadcast::Receiver<()>,
}

#[async_trait]
impl ReleaseListener for BroadcastListener {
    async fn wait_released(&mut self) -> Result<()> {
        match self.rx.recv().await {
            Ok(()) => Ok(()),
            // A missed notification only means more releases happened than we
            // observed; waking up and re-attempting is still correct.
            Err(broadcast::error::RecvError::Lagged(_)) => Ok(()),
            Err(broadcast::error::RecvError::Closed) => Err(LockError::Subscribe {
                key: self.key.clone(),
                reason: "release channel closed".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_try_acquire_sets_key_once() {
        let store = InMemoryLockStore::new();
        let ttl = Duration::from_secs(1);

        assert!(store.try_acquire("stock:SKU-1", "a", ttl).await.unwrap());
        assert!(!store.try_acquire("stock:SKU-1", "b", ttl).await.unwrap());
        assert!(store.is_held("stock:SKU-1").await);
    }

    #[tokio::test]
    async fn test_independent_keys_do_not_contend() {
        let store = InMemoryLockStore::new();
        let ttl = Duration::from_secs(1);

        assert!(store.try_acquire("stock:SKU-1", "a", ttl).await.unwrap());
        assert!(store.try_acquire("stock:SKU-2", "b", ttl).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_key_can_be_reacquired() {
        let store = InMemoryLockStore::new();
        let ttl = Duration::from_millis(100);

        assert!(store.try_acquire("k", "a", ttl).await.unwrap());
        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(!store.is_held("k").await);
        assert!(store.try_acquire("k", "b", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_requires_matching_token() {
        let store = InMemoryLockStore::new();
        let ttl = Duration::from_secs(1);

        store.try_acquire("k", "a", ttl).await.unwrap();
        assert!(!store.release_if_owned("k", "b").await.unwrap());
        assert!(store.is_held("k").await);
        assert!(store.release_if_owned("k", "a").await.unwrap());
        assert!(!store.is_held("k").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_after_expiry_is_noop() {
        let store = InMemoryLockStore::new();
        let ttl = Duration::from_millis(50);

        store.try_acquire("k", "a", ttl).await.unwrap();
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(!store.release_if_owned("k", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_subscriber_sees_release_notification() {
        let store = InMemoryLockStore::new();
        let ttl = Duration::from_secs(1);

        store.try_acquire("k", "a", ttl).await.unwrap();
        let mut listener = store.subscribe("k").await.unwrap();

        let waiter = tokio::spawn(async move { listener.wait_released().await });
        store.release_if_owned("k", "a").await.unwrap();

        waiter.await.unwrap().unwrap();
    }
}
