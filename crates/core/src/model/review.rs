use chrono::{Days, NaiveDate};

/// Fixed distance between a review's creation day and its next review day.
pub const REVIEW_INTERVAL_DAYS: u64 = 1;

/// One scheduled review.
///
/// `subject` is a plain name, not a reference to a subject row; it may
/// point at a name that no longer exists in the subjects table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
    pub date: NaiveDate,
    pub subject: String,
    pub topic: String,
    pub next_review_date: NaiveDate,
}

impl ReviewRecord {
    /// Build a review created on `today`, due one day later.
    #[must_use]
    pub fn scheduled(
        today: NaiveDate,
        subject: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        let next_review_date = today
            .checked_add_days(Days::new(REVIEW_INTERVAL_DAYS))
            .unwrap_or(NaiveDate::MAX);
        Self {
            date: today,
            subject: subject.into(),
            topic: topic.into(),
            next_review_date,
        }
    }
}

/// Append-only list of reviews, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewLog {
    records: Vec<ReviewRecord>,
}

impl ReviewLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_records(records: Vec<ReviewRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: ReviewRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[ReviewRecord] {
        &self.records
    }

    /// Reviews whose next review day is on or before `day`.
    pub fn due_on(&self, day: NaiveDate) -> impl Iterator<Item = &ReviewRecord> {
        self.records
            .iter()
            .filter(move |r| r.next_review_date <= day)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
