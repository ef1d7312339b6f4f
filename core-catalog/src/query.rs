//! Statement catalog for the album tables.
//!
//! All statements are templates with positional `?` parameters and the
//! `*PREFIX*` table-name token. User-scoped reads bind the user id as
//! the first parameter; list statements order by album name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use storage_traits::SqlValue;

use crate::error::{CatalogError, Result};
use crate::models::AlbumField;

pub(crate) const FIND_ALBUM: &str =
    "SELECT id, name, year, cover_file_id FROM *PREFIX*albums WHERE user_id = ? AND id = ?";

pub(crate) const FIND_ALL_ALBUMS: &str =
    "SELECT id, name, year, cover_file_id FROM *PREFIX*albums WHERE user_id = ? ORDER BY name";

pub(crate) const FIND_ALBUMS_BY_ARTIST: &str =
    "SELECT alb.id, alb.name, alb.year, alb.cover_file_id FROM *PREFIX*albums alb \
     JOIN *PREFIX*album_artists rel ON alb.id = rel.album_id \
     WHERE alb.user_id = ? AND rel.artist_id = ? ORDER BY alb.name";

pub(crate) const FIND_ALBUMS_BY_NAME: &str =
    "SELECT id, name, year, cover_file_id FROM *PREFIX*albums \
     WHERE user_id = ? AND name = ? ORDER BY name";

pub(crate) const FIND_ALBUMS_BY_NAME_FUZZY: &str =
    "SELECT id, name, year, cover_file_id FROM *PREFIX*albums \
     WHERE user_id = ? AND LOWER(name) LIKE LOWER(?) ORDER BY name";

pub(crate) const FIND_BY_NAME_AND_YEAR: &str =
    "SELECT id, name, year, cover_file_id FROM *PREFIX*albums \
     WHERE user_id = ? AND name = ? AND year = ?";

pub(crate) const FIND_BY_NAME_WITHOUT_YEAR: &str =
    "SELECT id, name, year, cover_file_id FROM *PREFIX*albums \
     WHERE user_id = ? AND name = ? AND year IS NULL";

pub(crate) const FIND_BY_YEAR_WITHOUT_NAME: &str =
    "SELECT id, name, year, cover_file_id FROM *PREFIX*albums \
     WHERE user_id = ? AND name IS NULL AND year = ?";

pub(crate) const FIND_WITHOUT_NAME_OR_YEAR: &str =
    "SELECT id, name, year, cover_file_id FROM *PREFIX*albums \
     WHERE user_id = ? AND name IS NULL AND year IS NULL";

pub(crate) const COUNT_ALBUMS: &str =
    "SELECT COUNT(*) AS count FROM *PREFIX*albums WHERE user_id = ?";

pub(crate) const COUNT_ALBUMS_BY_ARTIST: &str =
    "SELECT COUNT(*) AS count FROM *PREFIX*albums alb \
     JOIN *PREFIX*album_artists rel ON alb.id = rel.album_id \
     WHERE alb.user_id = ? AND rel.artist_id = ?";

pub(crate) const RELATION_EXISTS: &str =
    "SELECT 1 FROM *PREFIX*album_artists WHERE album_id = ? AND artist_id = ? LIMIT 1";

pub(crate) const INSERT_RELATION: &str =
    "INSERT INTO *PREFIX*album_artists (album_id, artist_id) VALUES (?,?)";

pub(crate) const REMOVE_COVER: &str =
    "UPDATE *PREFIX*albums SET cover_file_id = NULL WHERE cover_file_id = ?";

pub(crate) const UPDATE_FOLDER_COVER: &str =
    "UPDATE *PREFIX*albums SET cover_file_id = ? WHERE cover_file_id IS NULL AND id IN (\
     SELECT DISTINCT t.album_id FROM *PREFIX*tracks t \
     JOIN *PREFIX*files f ON t.file_id = f.id WHERE f.parent_id = ?)";

pub(crate) const SET_ALBUM_COVER: &str =
    "UPDATE *PREFIX*albums SET cover_file_id = ? WHERE id = ?";

pub(crate) const COVER_CANDIDATES: &str =
    "SELECT id, name FROM *PREFIX*files WHERE parent_id = ? AND mimetype LIKE 'image/%'";

pub(crate) const ALBUMS_WITHOUT_COVER: &str =
    "SELECT DISTINCT alb.id, f.parent_id FROM *PREFIX*albums alb \
     JOIN *PREFIX*tracks t ON alb.id = t.album_id \
     JOIN *PREFIX*files f ON t.file_id = f.id \
     WHERE alb.cover_file_id IS NULL";

/// Name matching mode for album lookups by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameMatch {
    /// Case-sensitive equality on the stored name.
    #[default]
    Exact,
    /// Case-insensitive contains match.
    Fuzzy,
}

impl NameMatch {
    pub(crate) fn statement(self) -> &'static str {
        match self {
            NameMatch::Exact => FIND_ALBUMS_BY_NAME,
            NameMatch::Fuzzy => FIND_ALBUMS_BY_NAME_FUZZY,
        }
    }

    /// Bind value for the name term. Fuzzy matching wraps the term in
    /// `%` wildcards; escaping LIKE metacharacters is left to callers
    /// that need it.
    pub(crate) fn pattern(self, name: &str) -> SqlValue {
        match self {
            NameMatch::Exact => SqlValue::Text(name.to_string()),
            NameMatch::Fuzzy => SqlValue::Text(format!("%{name}%")),
        }
    }
}

/// Exact-match key over the two optional album columns.
///
/// `None` means the stored value must be NULL, so each of the four
/// combinations selects its own statement shape. SQL equality would
/// never match a NULL cell, which is why these cannot collapse into a
/// single two-parameter statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameYearKey {
    NameAndYear { name: String, year: i64 },
    NameOnly { name: String },
    YearOnly { year: i64 },
    Neither,
}

impl NameYearKey {
    pub fn new(name: Option<&str>, year: Option<i64>) -> Self {
        match (name, year) {
            (Some(name), Some(year)) => NameYearKey::NameAndYear {
                name: name.to_string(),
                year,
            },
            (Some(name), None) => NameYearKey::NameOnly {
                name: name.to_string(),
            },
            (None, Some(year)) => NameYearKey::YearOnly { year },
            (None, None) => NameYearKey::Neither,
        }
    }

    /// Select statement for this key shape.
    pub(crate) fn statement(&self) -> &'static str {
        match self {
            NameYearKey::NameAndYear { .. } => FIND_BY_NAME_AND_YEAR,
            NameYearKey::NameOnly { .. } => FIND_BY_NAME_WITHOUT_YEAR,
            NameYearKey::YearOnly { .. } => FIND_BY_YEAR_WITHOUT_NAME,
            NameYearKey::Neither => FIND_WITHOUT_NAME_OR_YEAR,
        }
    }

    /// Bound parameters, user scope first. NULL-matched fields bind
    /// nothing because the statement encodes them as `IS NULL`.
    pub(crate) fn params(&self, user_id: &str) -> Vec<SqlValue> {
        let mut params = vec![SqlValue::Text(user_id.to_string())];
        match self {
            NameYearKey::NameAndYear { name, year } => {
                params.push(SqlValue::Text(name.clone()));
                params.push(SqlValue::Integer(*year));
            }
            NameYearKey::NameOnly { name } => params.push(SqlValue::Text(name.clone())),
            NameYearKey::YearOnly { year } => params.push(SqlValue::Integer(*year)),
            NameYearKey::Neither => {}
        }
        params
    }

    /// Key rendering used in not-found and ambiguous-result errors.
    pub fn describe(&self) -> String {
        match self {
            NameYearKey::NameAndYear { name, year } => format!("name={name}, year={year}"),
            NameYearKey::NameOnly { name } => format!("name={name}, year=NULL"),
            NameYearKey::YearOnly { year } => format!("name=NULL, year={year}"),
            NameYearKey::Neither => "name=NULL, year=NULL".to_string(),
        }
    }
}

/// `?,?,...` list for an id batch. Empty batches cannot produce a valid
/// `IN ()` clause, so they are rejected here; callers treat an empty
/// batch as a no-op before reaching this point.
pub(crate) fn in_placeholders(count: usize) -> Result<String> {
    if count == 0 {
        return Err(CatalogError::InvalidFilterState(
            "id batch must not be empty".to_string(),
        ));
    }
    Ok(vec!["?"; count].join(","))
}

pub(crate) fn relations_by_album_ids(count: usize) -> Result<String> {
    Ok(format!(
        "SELECT DISTINCT album_id, artist_id FROM *PREFIX*album_artists WHERE album_id IN ({})",
        in_placeholders(count)?
    ))
}

pub(crate) fn delete_relations_by_album_ids(count: usize) -> Result<String> {
    Ok(format!(
        "DELETE FROM *PREFIX*album_artists WHERE album_id IN ({})",
        in_placeholders(count)?
    ))
}

pub(crate) fn delete_albums_by_ids(count: usize) -> Result<String> {
    Ok(format!(
        "DELETE FROM *PREFIX*albums WHERE id IN ({})",
        in_placeholders(count)?
    ))
}

/// Insert statement over the changed fields, in column order. The user
/// scope must be among them; an unscoped album row would be unreachable
/// by every read in this module.
pub(crate) fn insert_album(fields: &BTreeSet<AlbumField>) -> Result<String> {
    if !fields.contains(&AlbumField::UserId) {
        return Err(CatalogError::InvalidFilterState(
            "album insert requires a user id".to_string(),
        ));
    }
    let columns: Vec<&str> = fields.iter().map(|field| field.column()).collect();
    Ok(format!(
        "INSERT INTO *PREFIX*albums ({}) VALUES ({}) RETURNING id",
        columns.join(", "),
        in_placeholders(columns.len())?
    ))
}

/// Update statement over the changed fields, in column order.
pub(crate) fn update_album(fields: &BTreeSet<AlbumField>) -> Result<String> {
    if fields.is_empty() {
        return Err(CatalogError::InvalidFilterState(
            "album update requires at least one changed field".to_string(),
        ));
    }
    let assignments: Vec<String> = fields
        .iter()
        .map(|field| format!("{} = ?", field.column()))
        .collect();
    Ok(format!(
        "UPDATE *PREFIX*albums SET {} WHERE id = ?",
        assignments.join(", ")
    ))
}

/// Bind list for an id batch.
pub(crate) fn id_params(ids: &[i64]) -> Vec<SqlValue> {
    ids.iter().map(|id| SqlValue::Integer(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_year_key_selects_one_statement_per_state() {
        let both = NameYearKey::new(Some("Low"), Some(1977));
        assert_eq!(
            both.statement(),
            "SELECT id, name, year, cover_file_id FROM *PREFIX*albums \
             WHERE user_id = ? AND name = ? AND year = ?"
        );
        assert_eq!(
            both.params("john"),
            vec![
                SqlValue::Text("john".to_string()),
                SqlValue::Text("Low".to_string()),
                SqlValue::Integer(1977),
            ]
        );

        let name_only = NameYearKey::new(Some("Low"), None);
        assert_eq!(
            name_only.statement(),
            "SELECT id, name, year, cover_file_id FROM *PREFIX*albums \
             WHERE user_id = ? AND name = ? AND year IS NULL"
        );
        assert_eq!(
            name_only.params("john"),
            vec![
                SqlValue::Text("john".to_string()),
                SqlValue::Text("Low".to_string()),
            ]
        );

        let year_only = NameYearKey::new(None, Some(1977));
        assert_eq!(
            year_only.statement(),
            "SELECT id, name, year, cover_file_id FROM *PREFIX*albums \
             WHERE user_id = ? AND name IS NULL AND year = ?"
        );
        assert_eq!(
            year_only.params("john"),
            vec![SqlValue::Text("john".to_string()), SqlValue::Integer(1977)]
        );

        let neither = NameYearKey::new(None, None);
        assert_eq!(
            neither.statement(),
            "SELECT id, name, year, cover_file_id FROM *PREFIX*albums \
             WHERE user_id = ? AND name IS NULL AND year IS NULL"
        );
        assert_eq!(
            neither.params("john"),
            vec![SqlValue::Text("john".to_string())]
        );
    }

    #[test]
    fn name_year_key_describes_null_fields() {
        assert_eq!(
            NameYearKey::new(Some("Low"), Some(1977)).describe(),
            "name=Low, year=1977"
        );
        assert_eq!(NameYearKey::new(None, None).describe(), "name=NULL, year=NULL");
    }

    #[test]
    fn fuzzy_match_wraps_term_in_wildcards() {
        assert_eq!(
            NameMatch::Fuzzy.pattern("test123test"),
            SqlValue::Text("%test123test%".to_string())
        );
        assert_eq!(
            NameMatch::Exact.pattern("test123test"),
            SqlValue::Text("test123test".to_string())
        );

        assert!(NameMatch::Fuzzy
            .statement()
            .contains("LOWER(name) LIKE LOWER(?)"));
        assert!(NameMatch::Exact.statement().contains("name = ?"));
    }

    #[test]
    fn in_placeholders_rejects_empty_batches() {
        assert_eq!(in_placeholders(1).unwrap(), "?");
        assert_eq!(in_placeholders(3).unwrap(), "?,?,?");
        assert!(matches!(
            in_placeholders(0),
            Err(CatalogError::InvalidFilterState(_))
        ));
    }

    #[test]
    fn batch_statements_embed_the_id_list() {
        assert_eq!(
            relations_by_album_ids(3).unwrap(),
            "SELECT DISTINCT album_id, artist_id FROM *PREFIX*album_artists \
             WHERE album_id IN (?,?,?)"
        );
        assert_eq!(
            delete_relations_by_album_ids(2).unwrap(),
            "DELETE FROM *PREFIX*album_artists WHERE album_id IN (?,?)"
        );
        assert_eq!(
            delete_albums_by_ids(2).unwrap(),
            "DELETE FROM *PREFIX*albums WHERE id IN (?,?)"
        );
    }

    #[test]
    fn insert_album_lists_changed_columns_in_order() {
        let mut fields = BTreeSet::new();
        fields.insert(AlbumField::Year);
        fields.insert(AlbumField::UserId);
        fields.insert(AlbumField::Name);

        assert_eq!(
            insert_album(&fields).unwrap(),
            "INSERT INTO *PREFIX*albums (user_id, name, year) VALUES (?,?,?) RETURNING id"
        );
    }

    #[test]
    fn insert_album_requires_the_user_scope() {
        let mut fields = BTreeSet::new();
        fields.insert(AlbumField::Name);

        assert!(matches!(
            insert_album(&fields),
            Err(CatalogError::InvalidFilterState(_))
        ));
    }

    #[test]
    fn update_album_lists_changed_columns_in_order() {
        let mut fields = BTreeSet::new();
        fields.insert(AlbumField::CoverFileId);
        fields.insert(AlbumField::Name);

        assert_eq!(
            update_album(&fields).unwrap(),
            "UPDATE *PREFIX*albums SET name = ?, cover_file_id = ? WHERE id = ?"
        );
        assert!(matches!(
            update_album(&BTreeSet::new()),
            Err(CatalogError::InvalidFilterState(_))
        ));
    }

    #[test]
    fn id_params_preserve_order() {
        assert_eq!(
            id_params(&[3, 1, 2]),
            vec![
                SqlValue::Integer(3),
                SqlValue::Integer(1),
                SqlValue::Integer(2),
            ]
        );
    }
}
