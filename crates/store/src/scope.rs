//! Logical transaction demarcation.

use std::future::Future;

/// Wraps a group of repository calls that form one logical transaction.
///
/// The persistence layer supplies actual atomicity per row; this wrapper
/// makes the boundary explicit and observable — one trace line on entry,
/// one on commit or rollback — so the saga's step boundaries can be audited
/// from logs. A failed scope maps to the saga's compensation path, not to a
/// storage-level rollback.
pub async fn scope<T, E, Fut>(name: &'static str, fut: Fut) -> std::result::Result<T, E>
where
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    tracing::debug!(scope = name, "transaction scope begin");
    match fut.await {
        Ok(value) => {
            tracing::debug!(scope = name, "transaction scope commit");
            Ok(value)
        }
        Err(e) => {
            tracing::debug!(scope = name, error = %e, "transaction scope rollback");
            Err(e)
        }
    }
}
