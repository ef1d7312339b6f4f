//! Album entity and the row types used by cover resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use storage_traits::{SqlRow, SqlValue};

use crate::error::{CatalogError, Result};

/// Album columns a setter can mark as changed.
///
/// Declaration order is the column order used when building insert and
/// update statements, so generated SQL is deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AlbumField {
    UserId,
    Name,
    Year,
    CoverFileId,
}

impl AlbumField {
    /// Column name in the albums table.
    pub fn column(self) -> &'static str {
        match self {
            AlbumField::UserId => "user_id",
            AlbumField::Name => "name",
            AlbumField::Year => "year",
            AlbumField::CoverFileId => "cover_file_id",
        }
    }
}

/// One album row plus the set of fields changed since it was loaded.
///
/// `name` and `year` are nullable in storage and `None` here means NULL,
/// not "unknown". Reads hydrate only the album's own columns; the owner
/// is supplied by the caller on every query and is carried on the entity
/// only so inserts can persist it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    id: Option<i64>,
    user_id: Option<String>,
    name: Option<String>,
    year: Option<i64>,
    cover_file_id: Option<i64>,
    #[serde(skip)]
    updated: BTreeSet<AlbumField>,
}

impl Album {
    /// New empty album with no changed fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate an album from a result row.
    ///
    /// The `id` column must be present; optional columns absent from the
    /// row hydrate as `None`. Change tracking starts clean.
    pub fn from_row(row: &SqlRow) -> Result<Self> {
        Ok(Self {
            id: Some(get_i64(row, "id")?),
            user_id: None,
            name: get_optional_string(row, "name")?,
            year: get_optional_i64(row, "year")?,
            cover_file_id: get_optional_i64(row, "cover_file_id")?,
            updated: BTreeSet::new(),
        })
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn year(&self) -> Option<i64> {
        self.year
    }

    pub fn cover_file_id(&self) -> Option<i64> {
        self.cover_file_id
    }

    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        self.user_id = Some(user_id.into());
        self.updated.insert(AlbumField::UserId);
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
        self.updated.insert(AlbumField::Name);
    }

    pub fn set_year(&mut self, year: Option<i64>) {
        self.year = year;
        self.updated.insert(AlbumField::Year);
    }

    pub fn set_cover_file_id(&mut self, cover_file_id: Option<i64>) {
        self.cover_file_id = cover_file_id;
        self.updated.insert(AlbumField::CoverFileId);
    }

    /// Fields changed since hydration or the last reset, in column order.
    pub fn updated_fields(&self) -> &BTreeSet<AlbumField> {
        &self.updated
    }

    /// Clear change tracking, typically after a successful write.
    pub fn reset_updated_fields(&mut self) {
        self.updated.clear();
    }

    pub(crate) fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    /// Bind value for one field, NULL when the field is unset.
    pub(crate) fn field_value(&self, field: AlbumField) -> SqlValue {
        match field {
            AlbumField::UserId => opt_text(&self.user_id),
            AlbumField::Name => opt_text(&self.name),
            AlbumField::Year => opt_integer(self.year),
            AlbumField::CoverFileId => opt_integer(self.cover_file_id),
        }
    }
}

/// Image file eligible to become an album's cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverCandidate {
    pub file_id: i64,
    pub file_name: String,
}

/// Album lacking a cover, paired with the folder its tracks live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverlessAlbum {
    pub album_id: i64,
    pub parent_folder_id: i64,
}

pub(crate) fn get_i64(row: &SqlRow, key: &str) -> Result<i64> {
    row.get(key)
        .and_then(|value| value.as_i64())
        .ok_or_else(|| missing_column(key))
}

pub(crate) fn get_string(row: &SqlRow, key: &str) -> Result<String> {
    row.get(key)
        .and_then(|value| value.as_string())
        .ok_or_else(|| missing_column(key))
}

pub(crate) fn get_optional_i64(row: &SqlRow, key: &str) -> Result<Option<i64>> {
    Ok(match row.get(key) {
        Some(SqlValue::Null) | None => None,
        Some(value) => Some(value.as_i64().ok_or_else(|| missing_column(key))?),
    })
}

pub(crate) fn get_optional_string(row: &SqlRow, key: &str) -> Result<Option<String>> {
    Ok(match row.get(key) {
        Some(SqlValue::Null) | None => None,
        Some(value) => Some(value.as_string().ok_or_else(|| missing_column(key))?),
    })
}

pub(crate) fn missing_column(column: &str) -> CatalogError {
    CatalogError::ColumnDecode(column.to_string())
}

fn opt_text(value: &Option<String>) -> SqlValue {
    value
        .as_ref()
        .map(|v| SqlValue::Text(v.clone()))
        .unwrap_or(SqlValue::Null)
}

fn opt_integer(value: Option<i64>) -> SqlValue {
    value.map(SqlValue::Integer).unwrap_or(SqlValue::Null)
}
