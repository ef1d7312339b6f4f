//! Album-to-artist relation maintenance.

use std::collections::HashMap;
use std::sync::Arc;

use storage_traits::{SqlValue, StorageError, StorageExecutor};
use tracing::debug;

use crate::error::Result;
use crate::models::get_i64;
use crate::query;

/// Maintains the `album_artists` join table.
///
/// Rows are plain `(album_id, artist_id)` pairs with a uniqueness
/// constraint; there is no surrogate key and no user scope because album
/// ids are already per-user.
pub struct AlbumArtistStore {
    store: Arc<dyn StorageExecutor>,
}

impl AlbumArtistStore {
    pub fn new(store: Arc<dyn StorageExecutor>) -> Self {
        Self { store }
    }

    /// Record that an artist contributed to an album, if not already
    /// recorded.
    ///
    /// Probes before inserting so the common repeated-scan path stays a
    /// single read. A concurrent writer can still win the race between
    /// probe and insert; the resulting unique violation means the pair
    /// exists, which is this operation's goal, so it is not an error.
    pub async fn add_if_not_exist(&self, album_id: i64, artist_id: i64) -> Result<()> {
        let params = vec![SqlValue::Integer(album_id), SqlValue::Integer(artist_id)];

        let existing = self
            .store
            .query_one_optional(query::RELATION_EXISTS, &params)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        match self.store.execute(query::INSERT_RELATION, &params).await {
            Ok(_) => Ok(()),
            Err(StorageError::UniqueViolation(message)) => {
                debug!(album_id, artist_id, %message, "Album-artist relation already present");
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Artist ids for each of the given albums, keyed by album id.
    ///
    /// Albums with no relations simply have no entry in the map. An empty
    /// id list returns an empty map without touching storage.
    pub async fn artists_by_album_ids(&self, album_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>> {
        if album_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let statement = query::relations_by_album_ids(album_ids.len())?;
        let rows = self
            .store
            .query(&statement, &query::id_params(album_ids))
            .await?;

        let mut artists_by_album: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in &rows {
            let album_id = get_i64(row, "album_id")?;
            let artist_id = get_i64(row, "artist_id")?;
            artists_by_album.entry(album_id).or_default().push(artist_id);
        }

        Ok(artists_by_album)
    }

    /// Remove every relation referencing the given albums. An empty id
    /// list is a no-op.
    pub async fn delete_by_album_ids(&self, album_ids: &[i64]) -> Result<()> {
        if album_ids.is_empty() {
            return Ok(());
        }

        let statement = query::delete_relations_by_album_ids(album_ids.len())?;
        let affected = self
            .store
            .execute(&statement, &query::id_params(album_ids))
            .await?;

        debug!(albums = album_ids.len(), rows_affected = affected, "Deleted album-artist relations");
        Ok(())
    }
}
