//! Distributed mutual-exclusion for contended checkout resources.
//!
//! This crate provides a lock primitive backed by a key-value store with
//! expiry (Redis in production, in-memory for tests):
//!
//! 1. Acquisition is an atomic set-if-absent write of a unique owner token
//!    under the lock key, with a TTL so a crashed holder cannot leak the
//!    lock forever.
//! 2. Contended callers subscribe to a per-key release channel and re-attempt
//!    acquisition on each release notification, bounded by a hard wall-clock
//!    timeout.
//! 3. Release is an atomic compare-token-and-delete that publishes on the
//!    release channel; a mismatched token is a warning-level no-op.
//!
//! [`LockManager::run_exclusive`] wraps acquire → body → guaranteed release
//! into a single scoped call.

pub mod error;
pub mod lock;
pub mod manager;
pub mod memory;
pub mod store;

pub use error::{LockError, Result};
pub use lock::{DistributedLock, Lock};
pub use manager::LockManager;
pub use memory::InMemoryLockStore;
pub use store::{LockStore, ReleaseListener};
