use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{AnalysisRow, Review};
use crate::storage::table::{read_analysis, write_analysis};

/// Progress marker written next to each checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckpointCursor {
    pub rows_processed: usize,
    pub last_review_id: String,
    pub checkpoint_file: PathBuf,
    pub updated_at: DateTime<Utc>,
}

/// Checkpoints for one output file. Each checkpoint holds the full prefix of
/// processed rows, so restoring never needs to append.
pub struct CheckpointStore {
    dir: PathBuf,
    stem: String,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// Store under `dir`, or `<output dir>/checkpoints` when unset.
    pub fn for_output(output: &Path, dir: Option<PathBuf>) -> Self {
        let dir = dir.unwrap_or_else(|| {
            output
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join("checkpoints")
        });
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("analysis");
        Self::new(dir, stem)
    }

    pub fn checkpoint_path(&self, rows_processed: usize) -> PathBuf {
        self.dir
            .join(format!("{}_checkpoint_{}.csv", self.stem, rows_processed))
    }

    pub fn cursor_path(&self) -> PathBuf {
        self.dir.join(format!("{}.cursor.json", self.stem))
    }

    /// Persist `rows` and point the cursor at them.
    pub fn save(&self, rows: &[AnalysisRow]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.checkpoint_path(rows.len());
        write_analysis(&path, rows)?;

        let cursor = CheckpointCursor {
            rows_processed: rows.len(),
            last_review_id: rows.last().map(|r| r.review.id.clone()).unwrap_or_default(),
            checkpoint_file: path.clone(),
            updated_at: Utc::now(),
        };
        let tmp = self.dir.join(format!("{}.cursor.json.tmp", self.stem));
        fs::write(&tmp, serde_json::to_string_pretty(&cursor)?)?;
        fs::rename(&tmp, self.cursor_path())?;

        Ok(path)
    }

    pub fn load_cursor(&self) -> Result<Option<CheckpointCursor>> {
        let path = self.cursor_path();
        if !path.exists() {
            return Ok(None);
        }
        let cursor = serde_json::from_str(&fs::read_to_string(path)?)?;
        Ok(Some(cursor))
    }

    /// Rows from the latest checkpoint, if it is a prefix of `reviews`.
    /// A cursor that no longer matches the input is ignored.
    pub fn restore(&self, reviews: &[Review]) -> Result<Option<Vec<AnalysisRow>>> {
        let Some(cursor) = self.load_cursor()? else {
            tracing::warn!(
                "No checkpoint cursor at {}; starting from scratch",
                self.cursor_path().display()
            );
            return Ok(None);
        };

        if cursor.rows_processed == 0 || cursor.rows_processed > reviews.len() {
            tracing::warn!(
                "Checkpoint covers {} rows but input has {}; starting from scratch",
                cursor.rows_processed,
                reviews.len()
            );
            return Ok(None);
        }

        if reviews[cursor.rows_processed - 1].id != cursor.last_review_id {
            tracing::warn!(
                "Checkpoint ends at review {} but input row {} is {}; starting from scratch",
                cursor.last_review_id,
                cursor.rows_processed,
                reviews[cursor.rows_processed - 1].id
            );
            return Ok(None);
        }

        if !cursor.checkpoint_file.exists() {
            tracing::warn!(
                "Checkpoint file {} is gone; starting from scratch",
                cursor.checkpoint_file.display()
            );
            return Ok(None);
        }

        let rows = read_analysis(&cursor.checkpoint_file)?;
        let matches_input = rows.len() == cursor.rows_processed
            && rows
                .iter()
                .zip(reviews)
                .all(|(row, review)| row.review.id == review.id);
        if !matches_input {
            tracing::warn!(
                "Checkpoint {} does not match the input; starting from scratch",
                cursor.checkpoint_file.display()
            );
            return Ok(None);
        }

        tracing::info!(
            "Resuming after {} rows from {}",
            rows.len(),
            cursor.checkpoint_file.display()
        );
        Ok(Some(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str) -> Review {
        Review {
            id: id.into(),
            source: "doordash".into(),
            app_type: "ios".into(),
            timestamp: "2024-02-02".into(),
            comment: format!("review {}", id),
            rating: 4,
        }
    }

    fn rows(ids: &[&str]) -> Vec<AnalysisRow> {
        ids.iter().map(|id| AnalysisRow::new(review(id))).collect()
    }

    #[test]
    fn test_paths_embed_row_index() {
        let store = CheckpointStore::for_output(Path::new("/out/complete_analysis.csv"), None);
        assert_eq!(
            store.checkpoint_path(500),
            PathBuf::from("/out/checkpoints/complete_analysis_checkpoint_500.csv")
        );
        assert_eq!(
            store.cursor_path(),
            PathBuf::from("/out/checkpoints/complete_analysis.cursor.json")
        );
    }

    #[test]
    fn test_save_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path(), "run");
        let input: Vec<Review> = ["a", "b", "c", "d"].iter().map(|id| review(id)).collect();

        let path = store.save(&rows(&["a", "b"])).unwrap();
        assert!(path.ends_with("run_checkpoint_2.csv"));

        let cursor = store.load_cursor().unwrap().unwrap();
        assert_eq!(cursor.rows_processed, 2);
        assert_eq!(cursor.last_review_id, "b");

        let restored = store.restore(&input).unwrap().unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[1].review.id, "b");
    }

    #[test]
    fn test_restore_ignores_mismatched_input() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path(), "run");
        store.save(&rows(&["a", "b"])).unwrap();

        let shuffled: Vec<Review> = ["b", "a", "c"].iter().map(|id| review(id)).collect();
        assert!(store.restore(&shuffled).unwrap().is_none());

        let shorter = vec![review("a")];
        assert!(store.restore(&shorter).unwrap().is_none());
    }

    #[test]
    fn test_store_for_same_output_finds_previous_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("run.csv");
        let input: Vec<Review> = ["a", "b", "c"].iter().map(|id| review(id)).collect();

        CheckpointStore::for_output(&output, None)
            .save(&rows(&["a", "b"]))
            .unwrap();

        let resumed = CheckpointStore::for_output(&output, None);
        let cursor = resumed.load_cursor().unwrap().unwrap();
        assert_eq!(cursor.rows_processed, 2);
        assert_eq!(resumed.restore(&input).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_restore_without_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path(), "run");
        assert!(store.restore(&[review("a")]).unwrap().is_none());
    }
}
