//! Storage executor implementations.
//!
//! The catalog talks to storage through `storage_traits::StorageExecutor`;
//! this module holds the bundled SQLite implementation.

pub mod sqlite;

pub use sqlite::SqliteStore;
