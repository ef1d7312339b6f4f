//! Storage executor contract for the Medley catalog crates.
//!
//! Catalog code issues SQL statement templates with positional `?`
//! parameters and receives rows as column/value maps. Everything about
//! connections is behind the [`StorageExecutor`] trait, so the catalog
//! layer can run against any backend that speaks this contract and unit
//! tests can substitute a mock executor.

pub mod error;
pub mod executor;

pub use error::{Result, StorageError};
pub use executor::{SqlRow, SqlValue, StorageExecutor, PREFIX_TOKEN};
