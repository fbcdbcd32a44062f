//! Read and write logical tables as CSV files on a remote store.

use std::sync::Arc;

use study_core::model::{ReviewLog, SubjectTable};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::mapping::{
    self, MappingError, REVIEW_COLUMNS, REVIEWS_PATH, SUBJECT_COLUMNS, SUBJECTS_PATH,
};
use crate::repository::{RemoteFileStore, StorageError, WriteOutcome};
use crate::table::{CsvTable, TableError};

/// Commit message used when the caller does not supply one.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update study data";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TableStoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

#[derive(Clone)]
pub struct TableStore {
    files: Arc<dyn RemoteFileStore>,
}

impl TableStore {
    #[must_use]
    pub fn new(files: Arc<dyn RemoteFileStore>) -> Self {
        Self { files }
    }

    /// Fetch and parse the table at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `TableStoreError::Storage` for transport or authorization
    /// failures and `TableStoreError::Table` for malformed CSV.
    pub async fn try_read_table(&self, path: &str) -> Result<Option<CsvTable>, TableStoreError> {
        let file = match self.files.get_file(path).await {
            Ok(file) => file,
            Err(StorageError::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(CsvTable::parse(&file.content)?))
    }

    /// Fetch the table at `path`, or an empty table with `default_columns`
    /// on any failure. Never fails.
    pub async fn read_table(&self, path: &str, default_columns: &[&str]) -> CsvTable {
        match self.try_read_table(path).await {
            Ok(Some(table)) => {
                debug!(path, rows = table.rows().len(), "loaded table");
                table
            }
            Ok(None) => {
                debug!(path, "table not found, using empty default");
                CsvTable::empty(default_columns)
            }
            Err(err) => {
                warn!(path, error = %err, "table read failed, using empty default");
                CsvTable::empty(default_columns)
            }
        }
    }

    /// Serialize `table` and store it at `path`.
    ///
    /// Updates the file at its current revision when it exists and creates
    /// it only when the store reports it missing. Any other fetch error is
    /// returned without attempting a create.
    ///
    /// # Errors
    ///
    /// Returns `TableStoreError` for serialization failures and for any
    /// store error from the fetch, create or update step.
    pub async fn write_table(
        &self,
        path: &str,
        table: &CsvTable,
        message: &str,
    ) -> Result<WriteOutcome, TableStoreError> {
        let content = table.to_csv_string()?;

        let outcome = match self.files.get_file(path).await {
            Ok(existing) => {
                self.files
                    .update_file(path, &content, message, &existing.sha)
                    .await?;
                WriteOutcome::Updated
            }
            Err(StorageError::NotFound) => {
                self.files.create_file(path, &content, message).await?;
                WriteOutcome::Created
            }
            Err(err) => {
                warn!(path, error = %err, "cannot tell whether table exists, not writing");
                return Err(err.into());
            }
        };

        info!(path, rows = table.rows().len(), ?outcome, "table written");
        Ok(outcome)
    }

    /// Load the subjects table, falling back to an empty one on any failure.
    pub async fn load_subjects(&self) -> SubjectTable {
        let csv = self.read_table(SUBJECTS_PATH, &SUBJECT_COLUMNS).await;
        mapping::subjects_from_table(&csv).unwrap_or_else(|err| {
            warn!(
                path = SUBJECTS_PATH,
                error = %err,
                "subjects table unreadable, using empty default"
            );
            SubjectTable::new()
        })
    }

    /// Load the reviews table, falling back to an empty one on any failure.
    pub async fn load_reviews(&self) -> ReviewLog {
        let csv = self.read_table(REVIEWS_PATH, &REVIEW_COLUMNS).await;
        mapping::reviews_from_table(&csv).unwrap_or_else(|err| {
            warn!(
                path = REVIEWS_PATH,
                error = %err,
                "reviews table unreadable, using empty default"
            );
            ReviewLog::new()
        })
    }

    /// # Errors
    ///
    /// See [`TableStore::write_table`].
    pub async fn save_subjects(
        &self,
        subjects: &SubjectTable,
        message: &str,
    ) -> Result<WriteOutcome, TableStoreError> {
        let csv = mapping::subjects_to_table(subjects)?;
        self.write_table(SUBJECTS_PATH, &csv, message).await
    }

    /// # Errors
    ///
    /// See [`TableStore::write_table`].
    pub async fn save_reviews(
        &self,
        reviews: &ReviewLog,
        message: &str,
    ) -> Result<WriteOutcome, TableStoreError> {
        let csv = mapping::reviews_to_table(reviews)?;
        self.write_table(REVIEWS_PATH, &csv, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{FileOp, InMemoryFileStore};

    fn store() -> (InMemoryFileStore, TableStore) {
        let files = InMemoryFileStore::new();
        let tables = TableStore::new(Arc::new(files.clone()));
        (files, tables)
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty_default_every_time() {
        let (_files, tables) = store();
        for _ in 0..3 {
            let table = tables.read_table("subjects.csv", &SUBJECT_COLUMNS).await;
            assert!(table.is_empty());
            assert!(table.has_columns(&SUBJECT_COLUMNS));
        }
    }

    #[tokio::test]
    async fn malformed_and_failed_reads_degrade() {
        let (files, tables) = store();
        files.insert("bad.csv", "a,b\n1,2,3\n").unwrap();
        let table = tables.read_table("bad.csv", &["x"]).await;
        assert!(table.has_columns(&["x"]));

        files.insert("ok.csv", "a\n1\n").unwrap();
        files
            .fail_next(FileOp::Get, StorageError::Unauthorized("bad token".into()))
            .unwrap();
        let table = tables.read_table("ok.csv", &["x"]).await;
        assert!(table.has_columns(&["x"]));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn write_creates_then_updates() {
        let (files, tables) = store();
        let table = CsvTable::empty(&["a"]);

        let first = tables.write_table("t.csv", &table, "one").await.unwrap();
        let second = tables.write_table("t.csv", &table, "two").await.unwrap();
        assert_eq!(first, WriteOutcome::Created);
        assert_eq!(second, WriteOutcome::Updated);
        assert_eq!(files.commit_messages(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn transient_fetch_error_does_not_create() {
        let (files, tables) = store();
        files
            .fail_next(FileOp::Get, StorageError::Connection("timeout".into()))
            .unwrap();

        let err = tables
            .write_table("t.csv", &CsvTable::empty(&["a"]), "m")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TableStoreError::Storage(StorageError::Connection(_))
        ));
        assert!(files.calls().iter().all(|(op, _)| *op == FileOp::Get));
        assert!(files.content("t.csv").is_none());
    }

    #[tokio::test]
    async fn failed_create_is_returned() {
        let (files, tables) = store();
        files.fail_next(FileOp::Create, StorageError::Conflict).unwrap();

        let err = tables
            .write_table("t.csv", &CsvTable::empty(&["a"]), "m")
            .await
            .unwrap_err();
        assert!(matches!(err, TableStoreError::Storage(StorageError::Conflict)));
        assert!(files.content("t.csv").is_none());
        assert!(files.commit_messages().is_empty());
    }

    #[tokio::test]
    async fn unreadable_subjects_fall_back_to_empty() {
        let (files, tables) = store();
        files
            .insert(SUBJECTS_PATH, "Subject,Weight,StudiedHours\nMath,eleven,0\n")
            .unwrap();
        assert!(tables.load_subjects().await.is_empty());
    }
}
