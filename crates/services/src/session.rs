//! Per-session state: the two in-memory tables and the running timer.

use storage::TableStore;
use study_core::model::{ReviewLog, SubjectOption, SubjectTable};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::SessionError;

/// In-memory copies of the remote tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTables {
    pub subjects: SubjectTable,
    pub reviews: ReviewLog,
}

/// Session-scoped context passed to every operation.
///
/// Tables are loaded once when the session opens and are only written back
/// by an explicit save. When the remote store was unreachable at startup
/// the tables stay absent and table operations fail with
/// `SessionError::NotLoaded`.
#[derive(Debug, Default)]
pub struct StudySession {
    tables: Option<SessionTables>,
    timer: Option<CancellationToken>,
}

impl StudySession {
    /// Load both tables from the store. Read failures degrade to empty tables.
    pub async fn load(store: &TableStore) -> Self {
        let subjects = store.load_subjects().await;
        let reviews = store.load_reviews().await;
        info!(
            subjects = subjects.len(),
            reviews = reviews.len(),
            "study session loaded"
        );
        Self::from_tables(SessionTables { subjects, reviews })
    }

    #[must_use]
    pub fn from_tables(tables: SessionTables) -> Self {
        Self {
            tables: Some(tables),
            timer: None,
        }
    }

    /// A session whose tables were never loaded.
    #[must_use]
    pub fn unloaded() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.tables.is_some()
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotLoaded` if the tables were never loaded.
    pub fn tables(&self) -> Result<&SessionTables, SessionError> {
        self.tables.as_ref().ok_or(SessionError::NotLoaded)
    }

    pub(crate) fn tables_mut(&mut self) -> Result<&mut SessionTables, SessionError> {
        self.tables.as_mut().ok_or(SessionError::NotLoaded)
    }

    #[must_use]
    pub fn subjects(&self) -> Option<&SubjectTable> {
        self.tables.as_ref().map(|t| &t.subjects)
    }

    #[must_use]
    pub fn reviews(&self) -> Option<&ReviewLog> {
        self.tables.as_ref().map(|t| &t.reviews)
    }

    /// Choices for the subject picker; the "General" placeholder alone when
    /// there are no subjects or the tables are absent.
    #[must_use]
    pub fn subject_options(&self) -> Vec<SubjectOption> {
        let empty = SubjectTable::new();
        SubjectOption::list(self.subjects().unwrap_or(&empty))
    }

    /// True while a timer run is armed and not cancelled.
    #[must_use]
    pub fn is_timer_active(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Clear the active flag. The running countdown notices within one tick
    /// and ends as cancelled. Returns false when no timer was active.
    pub fn stop_timer(&mut self) -> bool {
        match &self.timer {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn arm_timer(&mut self, token: CancellationToken) {
        self.timer = Some(token);
    }

    pub(crate) fn disarm_timer(&mut self) {
        self.timer = None;
    }
}
