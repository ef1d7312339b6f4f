//! # Album Catalog Module
//!
//! Owns album persistence for a per-user music collection and provides
//! mapper types for data access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema, pooling, and migrations
//! - The album entity with changed-field tracking
//! - Album lookups scoped to a user, including fuzzy name search and
//!   exact name/year matching where NULL is a distinct value
//! - Album-to-artist relations and batched relation lookups
//! - Cover image resolution from folder listings
//!
//! All statements go through the [`storage_traits::StorageExecutor`]
//! seam; [`adapters::SqliteStore`] is the bundled implementation.

pub mod adapters;
pub mod db;
pub mod error;
pub mod mappers;
pub mod models;
pub mod query;

pub use adapters::SqliteStore;
pub use db::{create_pool, create_test_pool, DatabaseConfig, DEFAULT_TABLE_PREFIX};
pub use error::{CatalogError, Result};
pub use mappers::{AlbumArtistStore, AlbumMapper, CoverResolver};
pub use models::{Album, AlbumField, CoverCandidate, CoverlessAlbum};
pub use query::{NameMatch, NameYearKey};
