//! Error types surfaced by storage executors.

use thiserror::Error;

/// Failure modes an executor can report back to the catalog layer.
///
/// `Unavailable` covers connection-level trouble (pool exhausted, socket
/// gone). `UniqueViolation` is reported separately so callers can detect
/// duplicate-key inserts.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Statement failed: {0}")]
    Statement(String),
}

/// Result type for executor operations.
pub type Result<T> = std::result::Result<T, StorageError>;
