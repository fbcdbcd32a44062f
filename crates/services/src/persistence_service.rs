use std::sync::Arc;

use storage::mapping::{REVIEWS_PATH, SUBJECTS_PATH};
use storage::{TableStore, WriteOutcome};
use tracing::{error, info};

use crate::error::PersistenceError;
use crate::notify::{Notice, Notifier};
use crate::session::StudySession;

/// Result of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub subjects: WriteOutcome,
    pub reviews: WriteOutcome,
}

/// Writes both session tables to the remote store on demand.
#[derive(Clone)]
pub struct PersistenceService {
    store: Option<TableStore>,
    notifier: Arc<dyn Notifier>,
    commit_message: String,
}

impl PersistenceService {
    #[must_use]
    pub fn new(
        store: Option<TableStore>,
        notifier: Arc<dyn Notifier>,
        commit_message: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            commit_message: commit_message.into(),
        }
    }

    /// Write subjects, then reviews, whether or not they changed.
    ///
    /// The two writes are independent: if the reviews write fails the
    /// subjects file has already been committed.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Offline` without a remote store,
    /// `PersistenceError::Session` when the tables are absent, and
    /// `PersistenceError::Write` for the first table that fails.
    pub async fn save_all(&self, session: &StudySession) -> Result<SaveReport, PersistenceError> {
        let Some(store) = &self.store else {
            self.notifier.notify(Notice::error(
                "Not connected to remote storage. Nothing was saved.",
            ));
            return Err(PersistenceError::Offline);
        };
        let tables = session.tables()?;

        let subjects = store
            .save_subjects(&tables.subjects, &self.commit_message)
            .await
            .map_err(|source| self.failed(SUBJECTS_PATH, Vec::new(), source))?;
        self.announce(SUBJECTS_PATH, subjects);

        let reviews = store
            .save_reviews(&tables.reviews, &self.commit_message)
            .await
            .map_err(|source| self.failed(REVIEWS_PATH, vec![SUBJECTS_PATH], source))?;
        self.announce(REVIEWS_PATH, reviews);

        Ok(SaveReport { subjects, reviews })
    }

    fn announce(&self, path: &str, outcome: WriteOutcome) {
        let message = match outcome {
            WriteOutcome::Updated => format!("Saved {path} to the remote repository."),
            WriteOutcome::Created => format!("Created {path} in the remote repository."),
        };
        info!(path, ?outcome, "table saved");
        self.notifier.notify(Notice::success(message));
    }

    fn failed(
        &self,
        table: &'static str,
        committed: Vec<&'static str>,
        source: storage::table_store::TableStoreError,
    ) -> PersistenceError {
        error!(table, error = %source, "save failed");
        self.notifier
            .notify(Notice::error(format!("Saving {table} failed: {source}")));
        PersistenceError::Write {
            table,
            committed,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NoticeLevel, RecordingNotifier};
    use crate::session::SessionTables;
    use storage::{FileOp, InMemoryFileStore, StorageError};
    use study_core::model::{SubjectName, Weight};

    fn setup() -> (InMemoryFileStore, RecordingNotifier, PersistenceService) {
        let files = InMemoryFileStore::new();
        let notifier = RecordingNotifier::new();
        let svc = PersistenceService::new(
            Some(TableStore::new(Arc::new(files.clone()))),
            Arc::new(notifier.clone()),
            "Update study data",
        );
        (files, notifier, svc)
    }

    fn session() -> StudySession {
        let mut tables = SessionTables::default();
        tables
            .subjects
            .add(SubjectName::new("Math").unwrap(), Weight::new(4).unwrap());
        StudySession::from_tables(tables)
    }

    #[tokio::test]
    async fn first_save_creates_then_updates() {
        let (files, notifier, svc) = setup();
        let session = session();

        let first = svc.save_all(&session).await.unwrap();
        assert_eq!(
            first,
            SaveReport {
                subjects: WriteOutcome::Created,
                reviews: WriteOutcome::Created
            }
        );
        let second = svc.save_all(&session).await.unwrap();
        assert_eq!(second.subjects, WriteOutcome::Updated);
        assert_eq!(second.reviews, WriteOutcome::Updated);

        assert_eq!(
            files.content(SUBJECTS_PATH).as_deref(),
            Some("Subject,Weight,StudiedHours\nMath,4,0.0\n")
        );
        assert_eq!(
            files.content(REVIEWS_PATH).as_deref(),
            Some("Date,Subject,Topic,NextReviewDate\n")
        );
        assert_eq!(notifier.notices().len(), 4);
        assert_eq!(files.commit_messages().len(), 4);
    }

    #[tokio::test]
    async fn second_table_failure_keeps_first_committed() {
        let (files, notifier, svc) = setup();
        files
            .insert(REVIEWS_PATH, "Date,Subject,Topic,NextReviewDate\n")
            .unwrap();
        files
            .fail_next(FileOp::Update, StorageError::HttpStatus(500))
            .unwrap();

        let err = svc.save_all(&session()).await.unwrap_err();
        match err {
            PersistenceError::Write {
                table, committed, ..
            } => {
                assert_eq!(table, REVIEWS_PATH);
                assert_eq!(committed, vec![SUBJECTS_PATH]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(files.content(SUBJECTS_PATH).is_some());
        let last = notifier.notices().pop().unwrap();
        assert_eq!(last.level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn failed_first_create_commits_nothing() {
        let (files, notifier, svc) = setup();
        files.fail_next(FileOp::Create, StorageError::Conflict).unwrap();

        let err = svc.save_all(&session()).await.unwrap_err();
        match err {
            PersistenceError::Write {
                table,
                committed,
                source,
            } => {
                assert_eq!(table, SUBJECTS_PATH);
                assert!(committed.is_empty());
                assert!(matches!(
                    source,
                    storage::table_store::TableStoreError::Storage(StorageError::Conflict)
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(files.content(SUBJECTS_PATH).is_none());
        assert!(files.content(REVIEWS_PATH).is_none());
        assert_eq!(notifier.notices().pop().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn offline_and_unloaded_refuse_to_save() {
        let notifier = RecordingNotifier::new();
        let offline = PersistenceService::new(None, Arc::new(notifier.clone()), "m");
        assert!(matches!(
            offline.save_all(&session()).await,
            Err(PersistenceError::Offline)
        ));
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Error);

        let (files, _n, svc) = setup();
        assert!(matches!(
            svc.save_all(&StudySession::unloaded()).await,
            Err(PersistenceError::Session(_))
        ));
        assert!(files.calls().is_empty());
    }
}
