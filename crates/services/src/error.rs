//! Shared error types for the services crate.

use thiserror::Error;

use storage::table_store::TableStoreError;
use study_core::model::SubjectError;
use study_core::timer::TimerError;

/// Errors emitted when the session tables are unavailable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("study tables were not loaded for this session")]
    NotLoaded,
}

/// Errors emitted by `StudyCycleService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyCycleError {
    #[error(transparent)]
    Subject(#[from] SubjectError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted by `TimerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TimerServiceError {
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error("timer task ended abnormally: {0}")]
    Join(String),
    #[error(transparent)]
    StudyCycle(#[from] StudyCycleError),
}

/// Errors emitted by `ReviewSchedulerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewSchedulerError {
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted by `PersistenceService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("not connected to remote storage; changes stay in memory")]
    Offline,
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Tables listed in `committed` were already written before the failure.
    #[error("saving {table} failed: {source}")]
    Write {
        table: &'static str,
        committed: Vec<&'static str>,
        #[source]
        source: TableStoreError,
    },
}
