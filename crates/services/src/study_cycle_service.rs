use std::sync::Arc;

use study_core::model::{SubjectError, SubjectId, SubjectName, Weight};
use tracing::debug;

use crate::error::StudyCycleError;
use crate::notify::{Notice, Notifier};
use crate::session::StudySession;

/// Adds subjects and accrues studied time on the session's subjects table.
#[derive(Clone)]
pub struct StudyCycleService {
    notifier: Arc<dyn Notifier>,
}

impl StudyCycleService {
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Append a subject with zero studied hours.
    ///
    /// The table is left untouched when validation fails. Names are not
    /// deduplicated.
    ///
    /// # Errors
    ///
    /// Returns `StudyCycleError::Subject` for an empty name or a weight
    /// outside 1..=5, and `StudyCycleError::Session` if the tables are absent.
    pub fn add_subject(
        &self,
        session: &mut StudySession,
        name: &str,
        weight: i64,
    ) -> Result<SubjectId, StudyCycleError> {
        let name = SubjectName::new(name)?;
        let weight = Weight::new(weight)?;
        let tables = session.tables_mut()?;
        let id = tables.subjects.add(name, weight);
        debug!(subject = %id, "subject added");
        self.notifier
            .notify(Notice::success("Subject added. Remember to save."));
        Ok(id)
    }

    /// Add `minutes / 60` hours to the first subject named `subject_name`.
    ///
    /// Returns the hours added.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::NotFound` (wrapped) when no subject has that name.
    pub fn accrue_hours(
        &self,
        session: &mut StudySession,
        subject_name: &str,
        minutes: u32,
    ) -> Result<f64, StudyCycleError> {
        let tables = session.tables_mut()?;
        let id = tables
            .subjects
            .first_by_name(subject_name)
            .map(|s| s.id())
            .ok_or_else(|| SubjectError::NotFound(subject_name.to_owned()))?;
        Ok(tables.subjects.accrue_minutes(id, minutes)?)
    }

    /// Add `minutes / 60` hours to the subject with the given id.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::NotFound` (wrapped) when the id is unknown.
    pub fn accrue_to(
        &self,
        session: &mut StudySession,
        id: SubjectId,
        minutes: u32,
    ) -> Result<f64, StudyCycleError> {
        let tables = session.tables_mut()?;
        let hours = tables.subjects.accrue_minutes(id, minutes)?;
        debug!(subject = %id, minutes, hours, "study time accrued");
        Ok(hours)
    }
}
