//! Album lookups, writes, and the cover workflow.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::{Pool, Sqlite};
use storage_traits::{SqlRow, SqlValue, StorageExecutor};
use tracing::debug;

use crate::adapters::SqliteStore;
use crate::error::{CatalogError, Result};
use crate::mappers::{AlbumArtistStore, CoverResolver};
use crate::models::{missing_column, Album, CoverlessAlbum};
use crate::query::{self, NameMatch, NameYearKey};

/// Data mapper for album entities.
///
/// Every read is scoped to the user id passed with the call; an album
/// that exists under another user is indistinguishable from one that
/// does not exist. Artist relations and cover resolution are handled by
/// [`AlbumArtistStore`] and [`CoverResolver`] over the same executor and
/// surfaced here so callers deal with one type.
pub struct AlbumMapper {
    store: Arc<dyn StorageExecutor>,
    relations: AlbumArtistStore,
    covers: CoverResolver,
}

impl AlbumMapper {
    pub fn new(store: Arc<dyn StorageExecutor>) -> Self {
        Self {
            relations: AlbumArtistStore::new(store.clone()),
            covers: CoverResolver::new(store.clone()),
            store,
        }
    }

    /// Convenience constructor wrapping a pool in a [`SqliteStore`] with
    /// the default table prefix.
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self::new(Arc::new(SqliteStore::from_pool(pool)))
    }

    /// Find one album by id.
    pub async fn find(&self, album_id: i64, user_id: &str) -> Result<Album> {
        let params = vec![SqlValue::Text(user_id.to_string()), SqlValue::Integer(album_id)];
        let rows = self.store.query(query::FIND_ALBUM, &params).await?;
        one_album(rows, album_id.to_string())
    }

    /// All of a user's albums, ordered by name.
    pub async fn find_all(&self, user_id: &str) -> Result<Vec<Album>> {
        let params = vec![SqlValue::Text(user_id.to_string())];
        self.fetch_albums(query::FIND_ALL_ALBUMS, params).await
    }

    /// A user's albums that the given artist contributed to, ordered by
    /// name.
    pub async fn find_all_by_artist(&self, artist_id: i64, user_id: &str) -> Result<Vec<Album>> {
        let params = vec![SqlValue::Text(user_id.to_string()), SqlValue::Integer(artist_id)];
        self.fetch_albums(query::FIND_ALBUMS_BY_ARTIST, params).await
    }

    /// A user's albums matching the given name, ordered by name.
    pub async fn find_all_by_name(
        &self,
        name: &str,
        user_id: &str,
        name_match: NameMatch,
    ) -> Result<Vec<Album>> {
        let params = vec![SqlValue::Text(user_id.to_string()), name_match.pattern(name)];
        self.fetch_albums(name_match.statement(), params).await
    }

    /// Find the single album with this exact name and year, where `None`
    /// matches a NULL cell rather than any value.
    pub async fn find_by_name_and_year(
        &self,
        name: Option<&str>,
        year: Option<i64>,
        user_id: &str,
    ) -> Result<Album> {
        let key = NameYearKey::new(name, year);
        let rows = self.store.query(key.statement(), &key.params(user_id)).await?;
        one_album(rows, key.describe())
    }

    /// Number of albums the user owns.
    pub async fn count(&self, user_id: &str) -> Result<i64> {
        let params = vec![SqlValue::Text(user_id.to_string())];
        self.count_with(query::COUNT_ALBUMS, params).await
    }

    /// Number of the user's albums the given artist contributed to.
    pub async fn count_by_artist(&self, artist_id: i64, user_id: &str) -> Result<i64> {
        let params = vec![SqlValue::Text(user_id.to_string()), SqlValue::Integer(artist_id)];
        self.count_with(query::COUNT_ALBUMS_BY_ARTIST, params).await
    }

    /// Persist a new album built from its changed fields and return it
    /// with the generated id assigned and tracking cleared.
    pub async fn insert(&self, mut album: Album) -> Result<Album> {
        let statement = query::insert_album(album.updated_fields())?;
        let params: Vec<SqlValue> = album
            .updated_fields()
            .iter()
            .map(|field| album.field_value(*field))
            .collect();

        let row = self.store.query_one(&statement, &params).await?;
        let id = row
            .get("id")
            .and_then(|value| value.as_i64())
            .ok_or_else(|| missing_column("id"))?;

        album.assign_id(id);
        album.reset_updated_fields();
        debug!(album_id = id, "Inserted album");
        Ok(album)
    }

    /// Persist the changed fields of an existing album.
    ///
    /// An album with no changed fields is returned untouched without a
    /// statement being issued. Updating an id that no longer exists is
    /// reported as not found.
    pub async fn update(&self, mut album: Album) -> Result<Album> {
        let id = album.id().ok_or_else(|| {
            CatalogError::InvalidFilterState("album update requires an id".to_string())
        })?;
        if album.updated_fields().is_empty() {
            return Ok(album);
        }

        let statement = query::update_album(album.updated_fields())?;
        let mut params: Vec<SqlValue> = album
            .updated_fields()
            .iter()
            .map(|field| album.field_value(*field))
            .collect();
        params.push(SqlValue::Integer(id));

        let affected = self.store.execute(&statement, &params).await?;
        if affected == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "Album".to_string(),
                id: id.to_string(),
            });
        }

        album.reset_updated_fields();
        Ok(album)
    }

    /// Delete one album and its artist relations.
    pub async fn delete(&self, album: Album) -> Result<()> {
        let id = album.id().ok_or_else(|| {
            CatalogError::InvalidFilterState("album delete requires an id".to_string())
        })?;
        self.delete_by_id(&[id]).await
    }

    /// Delete the given albums and their artist relations. Relations go
    /// first so no orphaned pairs survive a partial failure. An empty id
    /// list is a no-op; ids that do not exist are silently skipped.
    pub async fn delete_by_id(&self, album_ids: &[i64]) -> Result<()> {
        if album_ids.is_empty() {
            return Ok(());
        }

        self.relations.delete_by_album_ids(album_ids).await?;

        let statement = query::delete_albums_by_ids(album_ids.len())?;
        let affected = self
            .store
            .execute(&statement, &query::id_params(album_ids))
            .await?;

        debug!(albums = album_ids.len(), rows_affected = affected, "Deleted albums");
        Ok(())
    }

    /// Artist ids for each of the given albums, keyed by album id.
    pub async fn get_album_artists_by_album_id(
        &self,
        album_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<i64>>> {
        self.relations.artists_by_album_ids(album_ids).await
    }

    /// Record that an artist contributed to an album, if not already
    /// recorded.
    pub async fn add_album_artist_relation_if_not_exist(
        &self,
        album_id: i64,
        artist_id: i64,
    ) -> Result<()> {
        self.relations.add_if_not_exist(album_id, artist_id).await
    }

    /// Detach a deleted image file from every album using it as cover.
    /// Albums that referenced it revert to coverless.
    pub async fn remove_cover(&self, cover_file_id: i64) -> Result<()> {
        let affected = self
            .store
            .execute(query::REMOVE_COVER, &[SqlValue::Integer(cover_file_id)])
            .await?;
        debug!(cover_file_id, rows_affected = affected, "Cleared album cover references");
        Ok(())
    }

    /// Offer a newly discovered image as cover to every coverless album
    /// whose tracks live in the given folder. Albums that already have a
    /// cover keep it.
    pub async fn update_cover(&self, cover_file_id: i64, parent_folder_id: i64) -> Result<()> {
        let affected = self
            .store
            .execute(
                query::UPDATE_FOLDER_COVER,
                &[
                    SqlValue::Integer(cover_file_id),
                    SqlValue::Integer(parent_folder_id),
                ],
            )
            .await?;
        debug!(
            cover_file_id,
            parent_folder_id,
            rows_affected = affected,
            "Assigned cover to coverless albums in folder"
        );
        Ok(())
    }

    /// Pick and persist a cover for the album from the images in the
    /// given folder. See [`CoverResolver::find_album_cover`].
    pub async fn find_album_cover(
        &self,
        album_id: i64,
        parent_folder_id: i64,
    ) -> Result<Option<i64>> {
        self.covers.find_album_cover(album_id, parent_folder_id).await
    }

    /// Albums with no cover, paired with their tracks' parent folders.
    pub async fn albums_without_cover(&self) -> Result<Vec<CoverlessAlbum>> {
        self.covers.albums_without_cover().await
    }

    async fn fetch_albums(&self, statement: &str, params: Vec<SqlValue>) -> Result<Vec<Album>> {
        let rows = self.store.query(statement, &params).await?;
        rows.iter().map(Album::from_row).collect()
    }

    async fn count_with(&self, statement: &str, params: Vec<SqlValue>) -> Result<i64> {
        let row = self.store.query_one(statement, &params).await?;
        row.get("count")
            .and_then(|value| value.as_i64())
            .ok_or_else(|| missing_column("count"))
    }
}

/// Enforce the exactly-one contract for single-entity lookups.
fn one_album(rows: Vec<SqlRow>, key: String) -> Result<Album> {
    match rows.as_slice() {
        [] => Err(CatalogError::NotFound {
            entity_type: "Album".to_string(),
            id: key,
        }),
        [row] => Album::from_row(row),
        _ => Err(CatalogError::AmbiguousResult {
            entity_type: "Album".to_string(),
            id: key,
        }),
    }
}
