//! Lock error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while acquiring or releasing a distributed lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// No release notification arrived before the wall-clock timeout.
    /// The protected resource must be assumed still contended.
    #[error("timed out after {waited:?} waiting for lock '{key}'")]
    Timeout { key: String, waited: Duration },

    /// Subscribing to the release-notification channel failed.
    #[error("failed to subscribe to release channel for lock '{key}': {reason}")]
    Subscribe { key: String, reason: String },

    /// The backing key-value store reported an error.
    #[error("lock store error: {0}")]
    Store(String),
}

/// Result type for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;
