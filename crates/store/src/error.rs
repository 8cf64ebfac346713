use common::Version;
use thiserror::Error;

/// Errors that can occur when interacting with a repository.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional update lost to a concurrent writer. Transient: the
    /// caller is expected to re-read and retry, never to merge.
    #[error("version conflict for {entity} {id}: expected version {expected}, found {actual}")]
    VersionConflict {
        entity: &'static str,
        id: String,
        expected: Version,
        actual: Version,
    },

    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An entity with this key already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// The backing database failed.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StoreError>;
