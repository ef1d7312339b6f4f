//! # Data Mapper Implementation
//!
//! This module provides the mapper types that translate between album
//! entities and the underlying tables.
//!
//! ## Architecture
//!
//! - Mappers hold an `Arc<dyn StorageExecutor>` and issue statement
//!   templates from the statement catalog
//! - All read operations are scoped to a user id supplied per call
//! - All operations return `Result<T>` for error handling
//!
//! ## Available Mappers
//!
//! - `AlbumMapper` - Album lookups, writes, and the cover workflow
//! - `AlbumArtistStore` - Album-to-artist relation maintenance
//! - `CoverResolver` - Cover selection from folder listings

pub mod album;
pub mod album_artists;
pub mod cover;

pub use album::AlbumMapper;
pub use album_artists::AlbumArtistStore;
pub use cover::CoverResolver;
