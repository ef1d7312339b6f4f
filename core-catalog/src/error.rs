//! Error types for catalog operations.

use storage_traits::StorageError;
use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Database connection or migration level error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failure reported by the storage executor.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A single-entity lookup matched no rows.
    #[error("Entity not found: {entity_type} with {id}")]
    NotFound { entity_type: String, id: String },

    /// A single-entity lookup matched more than one row.
    #[error("Ambiguous result: {entity_type} with {id} matched more than one row")]
    AmbiguousResult { entity_type: String, id: String },

    /// The requested operation cannot produce a valid statement,
    /// for example an update with no id or an empty id batch.
    #[error("Invalid filter state: {0}")]
    InvalidFilterState(String),

    /// A result row was missing a column or held an unexpected type.
    #[error("Missing or invalid column: {0}")]
    ColumnDecode(String),

    /// Migration error.
    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
