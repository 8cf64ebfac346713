//! Explicit retry policy for optimistic-concurrency conflicts.
//!
//! Conflicts are transient: the correct response is a fresh read followed by
//! a re-attempted mutation, a bounded number of times. Validation errors are
//! permanent and must pass through untouched, so the policy only retries
//! errors that identify themselves as version conflicts.

use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;

/// Classifies errors for the retry loop.
pub trait ConflictKind {
    /// Returns true if this error is a version conflict that a fresh
    /// read-mutate-write attempt can resolve.
    fn is_version_conflict(&self) -> bool;
}

impl ConflictKind for StoreError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Bounded retry with linear backoff for conflicted mutations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy with an attempt bound and a base backoff; the sleep
    /// between attempts grows linearly with the attempt number.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        assert!(max_attempts >= 1, "retry policy needs at least one attempt");
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Returns the attempt bound.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `op` until it succeeds, fails with a non-conflict error, or the
    /// attempt bound is reached. Each attempt must re-read the entity so the
    /// mutation applies to fresh state.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: ConflictKind,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Err(e) if e.is_version_conflict() && attempt < self.max_attempts => {
                    tracing::debug!(attempt, "version conflict, retrying from a fresh read");
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(20))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use common::Version;

    fn conflict() -> StoreError {
        StoreError::VersionConflict {
            entity: "wallet",
            id: "w1".to_string(),
            expected: Version::initial(),
            actual: Version::new(1),
        }
    }

    fn not_found() -> StoreError {
        StoreError::NotFound {
            entity: "wallet",
            id: "w1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();

        let result: Result<i32, StoreError> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(5, Duration::from_millis(10));

        let result: Result<&str, StoreError> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(conflict())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(10));

        let result: Result<(), StoreError> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(conflict())
                }
            })
            .await;

        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_conflict_errors_pass_through() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(5, Duration::from_millis(10));

        let result: Result<(), StoreError> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(not_found())
                }
            })
            .await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
