//! Saga configuration loaded from environment variables.

use std::time::Duration;

use store::RetryPolicy;

/// How stock deduction is guarded against concurrent checkouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockGuard {
    /// Version-checked writes with bounded retry. Higher throughput; a
    /// writer can lose repeatedly under heavy contention.
    #[default]
    Optimistic,

    /// Per-product distributed lock around each deduction. Guarantees
    /// forward progress for hot products at the cost of serialization.
    Pessimistic,
}

/// Saga tuning with sensible defaults.
///
/// Reads from environment variables:
/// - `LOCK_TTL_MS` — lock time-to-live in milliseconds (default: `3000`)
/// - `LOCK_WAIT_MS` — wall-clock budget for a contended lock (default: `3000`)
/// - `OCC_MAX_ATTEMPTS` — attempts per conflicted mutation (default: `3`)
/// - `OCC_BACKOFF_MS` — base backoff between attempts (default: `20`)
/// - `STOCK_GUARD` — `optimistic` or `pessimistic` (default: `optimistic`)
#[derive(Debug, Clone)]
pub struct Config {
    pub lock_ttl: Duration,
    pub lock_wait: Duration,
    pub occ_max_attempts: u32,
    pub occ_backoff: Duration,
    pub stock_guard: StockGuard,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lock_ttl: env_millis("LOCK_TTL_MS").unwrap_or(defaults.lock_ttl),
            lock_wait: env_millis("LOCK_WAIT_MS").unwrap_or(defaults.lock_wait),
            occ_max_attempts: std::env::var("OCC_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.occ_max_attempts),
            occ_backoff: env_millis("OCC_BACKOFF_MS").unwrap_or(defaults.occ_backoff),
            stock_guard: match std::env::var("STOCK_GUARD").as_deref() {
                Ok("pessimistic") => StockGuard::Pessimistic,
                _ => defaults.stock_guard,
            },
        }
    }

    /// Builds the retry policy for conflicted mutations.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.occ_max_attempts, self.occ_backoff)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_millis(3000),
            lock_wait: Duration::from_millis(3000),
            occ_max_attempts: 3,
            occ_backoff: Duration::from_millis(20),
            stock_guard: StockGuard::Optimistic,
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.lock_ttl, Duration::from_millis(3000));
        assert_eq!(config.lock_wait, Duration::from_millis(3000));
        assert_eq!(config.occ_max_attempts, 3);
        assert_eq!(config.occ_backoff, Duration::from_millis(20));
        assert_eq!(config.stock_guard, StockGuard::Optimistic);
    }

    #[test]
    fn test_retry_policy_uses_configured_attempts() {
        let config = Config {
            occ_max_attempts: 7,
            ..Config::default()
        };
        assert_eq!(config.retry_policy().max_attempts(), 7);
    }
}
