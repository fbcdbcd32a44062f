use std::sync::Arc;

use study_core::Clock;
use study_core::model::{ReviewRecord, StudyTarget};
use tracing::debug;

use crate::error::ReviewSchedulerError;
use crate::notify::{Notice, Notifier};
use crate::session::StudySession;

/// Appends review records dated today and due tomorrow.
#[derive(Clone)]
pub struct ReviewSchedulerService {
    clock: Clock,
    notifier: Arc<dyn Notifier>,
}

impl ReviewSchedulerService {
    #[must_use]
    pub fn new(clock: Clock, notifier: Arc<dyn Notifier>) -> Self {
        Self { clock, notifier }
    }

    /// Append a review for `subject_name`. The name is stored as given and
    /// may be the "General" placeholder. Existing rows are never touched.
    ///
    /// # Errors
    ///
    /// Returns `ReviewSchedulerError::Session` if the tables are absent.
    pub fn schedule_review(
        &self,
        session: &mut StudySession,
        subject_name: &str,
        topic: &str,
    ) -> Result<ReviewRecord, ReviewSchedulerError> {
        let tables = session.tables_mut()?;
        let record = ReviewRecord::scheduled(self.clock.today(), subject_name, topic);
        tables.reviews.push(record.clone());
        debug!(subject = subject_name, next = %record.next_review_date, "review scheduled");
        self.notifier.notify(Notice::success("Review scheduled."));
        Ok(record)
    }

    /// Same as [`Self::schedule_review`] for a picker entry.
    ///
    /// # Errors
    ///
    /// Returns `ReviewSchedulerError::Session` if the tables are absent.
    pub fn schedule_for(
        &self,
        session: &mut StudySession,
        target: &StudyTarget,
        topic: &str,
    ) -> Result<ReviewRecord, ReviewSchedulerError> {
        self.schedule_review(session, target.label(), topic)
    }

    /// Reviews due today or earlier.
    #[must_use]
    pub fn due_today(&self, session: &StudySession) -> Vec<ReviewRecord> {
        let today = self.clock.today();
        session
            .reviews()
            .map(|log| log.due_on(today).cloned().collect())
            .unwrap_or_default()
    }
}
