//! Cover image selection from folder listings.

use std::sync::Arc;

use storage_traits::{SqlRow, SqlValue, StorageExecutor};
use tracing::debug;

use crate::error::Result;
use crate::models::{get_i64, get_string, CoverCandidate, CoverlessAlbum};
use crate::query;

/// Filename keywords that promote a candidate, highest priority first.
/// Matching is case-insensitive and substring-based, so `Cover-front.png`
/// ranks as `cover`.
pub const COVER_NAME_PRIORITY: [&str; 4] = ["cover", "albumart", "folder", "front"];

/// Resolves album covers from the image files listed in a folder.
pub struct CoverResolver {
    store: Arc<dyn StorageExecutor>,
}

impl CoverResolver {
    pub fn new(store: Arc<dyn StorageExecutor>) -> Self {
        Self { store }
    }

    /// Pick a cover for the album from the images in the given folder and
    /// persist the choice.
    ///
    /// Returns the chosen file id, or `None` when the folder holds no
    /// image files, in which case nothing is written. Candidates that
    /// match no keyword all rank below every keyword match, so a folder
    /// of unhelpfully named images still yields its first listed file.
    pub async fn find_album_cover(
        &self,
        album_id: i64,
        parent_folder_id: i64,
    ) -> Result<Option<i64>> {
        let rows = self
            .store
            .query(
                query::COVER_CANDIDATES,
                &[SqlValue::Integer(parent_folder_id)],
            )
            .await?;
        let candidates = rows
            .iter()
            .map(row_to_candidate)
            .collect::<Result<Vec<CoverCandidate>>>()?;

        let winner = match pick_cover(&candidates) {
            Some(candidate) => candidate,
            None => {
                debug!(album_id, parent_folder_id, "No cover candidates in folder");
                return Ok(None);
            }
        };

        self.store
            .execute(
                query::SET_ALBUM_COVER,
                &[SqlValue::Integer(winner.file_id), SqlValue::Integer(album_id)],
            )
            .await?;

        debug!(
            album_id,
            file_id = winner.file_id,
            file_name = %winner.file_name,
            "Selected album cover"
        );
        Ok(Some(winner.file_id))
    }

    /// Albums with no cover, each paired with the parent folder of one of
    /// its tracks' files. Feeding these pairs back into
    /// [`Self::find_album_cover`] backfills covers after a scan.
    pub async fn albums_without_cover(&self) -> Result<Vec<CoverlessAlbum>> {
        let rows = self.store.query(query::ALBUMS_WITHOUT_COVER, &[]).await?;
        rows.iter().map(row_to_coverless).collect()
    }
}

/// Best candidate under the keyword ranking; listing order breaks ties.
fn pick_cover(candidates: &[CoverCandidate]) -> Option<&CoverCandidate> {
    candidates
        .iter()
        .min_by_key(|candidate| keyword_rank(&candidate.file_name))
}

/// Position of the best matching keyword, or one past the end when no
/// keyword matches.
fn keyword_rank(file_name: &str) -> usize {
    let lowered = file_name.to_lowercase();
    COVER_NAME_PRIORITY
        .iter()
        .position(|keyword| lowered.contains(keyword))
        .unwrap_or(COVER_NAME_PRIORITY.len())
}

fn row_to_candidate(row: &SqlRow) -> Result<CoverCandidate> {
    Ok(CoverCandidate {
        file_id: get_i64(row, "id")?,
        file_name: get_string(row, "name")?,
    })
}

fn row_to_coverless(row: &SqlRow) -> Result<CoverlessAlbum> {
    Ok(CoverlessAlbum {
        album_id: get_i64(row, "id")?,
        parent_folder_id: get_i64(row, "parent_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::mock_store::MockStore;
    use mockall::Sequence;

    fn candidate(file_id: i64, file_name: &str) -> CoverCandidate {
        CoverCandidate {
            file_id,
            file_name: file_name.to_string(),
        }
    }

    fn file_row(id: i64, name: &str) -> SqlRow {
        let mut row = SqlRow::new();
        row.insert("id".to_string(), SqlValue::Integer(id));
        row.insert("name".to_string(), SqlValue::Text(name.to_string()));
        row
    }

    #[test]
    fn keyword_rank_is_case_insensitive() {
        assert_eq!(keyword_rank("Cover.jpg"), 0);
        assert_eq!(keyword_rank("ALBUMART.png"), 1);
        assert_eq!(keyword_rank("folder.jpeg"), 2);
        assert_eq!(keyword_rank("Front-matter.gif"), 3);
        assert_eq!(keyword_rank("liner-notes.png"), 4);
    }

    #[test]
    fn pick_cover_prefers_keyword_priority_over_listing_order() {
        let candidates = vec![
            candidate(8, "front.jpg"),
            candidate(6, "folder.jpg"),
            candidate(7, "coverasd.jpg"),
        ];
        assert_eq!(pick_cover(&candidates).map(|c| c.file_id), Some(7));
    }

    #[test]
    fn pick_cover_breaks_ties_by_listing_order() {
        let candidates = vec![
            candidate(2, "cover-back.jpg"),
            candidate(3, "cover-front.jpg"),
        ];
        assert_eq!(pick_cover(&candidates).map(|c| c.file_id), Some(2));
    }

    #[test]
    fn pick_cover_falls_back_to_the_first_listed_candidate() {
        let candidates = vec![candidate(4, "scan01.png"), candidate(5, "scan02.png")];
        assert_eq!(pick_cover(&candidates).map(|c| c.file_id), Some(4));
        assert_eq!(pick_cover(&[]), None);
    }

    #[tokio::test]
    async fn picks_the_best_candidate_and_persists_it() {
        let mut store = MockStore::new();
        let mut seq = Sequence::new();

        store
            .expect_query()
            .withf(|statement, params| {
                statement == query::COVER_CANDIDATES
                    && params == [SqlValue::Integer(19)].as_slice()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(vec![
                    file_row(5, "1123213.jpg"),
                    file_row(7, "coverasd.jpg"),
                    file_row(4, "albumart.jpg"),
                    file_row(6, "folder.jpg"),
                    file_row(8, "front.jpg"),
                ])
            });
        store
            .expect_execute()
            .withf(|statement, params| {
                statement == query::SET_ALBUM_COVER
                    && params == [SqlValue::Integer(7), SqlValue::Integer(12)].as_slice()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(1));

        let resolver = CoverResolver::new(Arc::new(store));
        let chosen = resolver.find_album_cover(12, 19).await.unwrap();
        assert_eq!(chosen, Some(7));
    }

    #[tokio::test]
    async fn folders_without_images_change_nothing() {
        let mut store = MockStore::new();
        store.expect_query().times(1).returning(|_, _| Ok(vec![]));

        let resolver = CoverResolver::new(Arc::new(store));
        let chosen = resolver.find_album_cover(3, 4).await.unwrap();
        assert_eq!(chosen, None);
    }

    #[tokio::test]
    async fn coverless_scan_reports_album_and_folder_pairs() {
        let mut store = MockStore::new();
        store
            .expect_query()
            .withf(|statement, params| {
                statement == query::ALBUMS_WITHOUT_COVER && params.is_empty()
            })
            .times(1)
            .returning(|_, _| {
                let mut row = SqlRow::new();
                row.insert("id".to_string(), SqlValue::Integer(31));
                row.insert("parent_id".to_string(), SqlValue::Integer(100));
                Ok(vec![row])
            });

        let resolver = CoverResolver::new(Arc::new(store));
        let gaps = resolver.albums_without_cover().await.unwrap();
        assert_eq!(
            gaps,
            vec![CoverlessAlbum {
                album_id: 31,
                parent_folder_id: 100,
            }]
        );
    }
}
