mod ids;
mod review;
mod subject;
mod target;

pub use ids::SubjectId;
pub use review::{REVIEW_INTERVAL_DAYS, ReviewLog, ReviewRecord};
pub use subject::{Subject, SubjectError, SubjectName, SubjectTable, Weight};
pub use target::{GENERAL_SUBJECT, StudyTarget, SubjectOption};
