use crate::model::ids::SubjectId;
use crate::model::subject::SubjectTable;

/// Placeholder subject offered when no real subject exists yet.
pub const GENERAL_SUBJECT: &str = "General";

/// What a timer run or a review is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyTarget {
    /// The "General" placeholder. Never accrues hours.
    General,
    Subject { id: SubjectId, name: String },
}

impl StudyTarget {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            StudyTarget::General => GENERAL_SUBJECT,
            StudyTarget::Subject { name, .. } => name,
        }
    }

    #[must_use]
    pub fn subject_id(&self) -> Option<SubjectId> {
        match self {
            StudyTarget::General => None,
            StudyTarget::Subject { id, .. } => Some(*id),
        }
    }
}

/// One entry of the subject picker shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectOption {
    pub label: String,
    pub target: StudyTarget,
}

impl SubjectOption {
    /// Distinct names in insertion order, first row winning; or the
    /// "General" placeholder alone when the table is empty.
    #[must_use]
    pub fn list(table: &SubjectTable) -> Vec<Self> {
        if table.is_empty() {
            return vec![Self {
                label: GENERAL_SUBJECT.to_owned(),
                target: StudyTarget::General,
            }];
        }

        let mut out: Vec<Self> = Vec::new();
        for subject in table.iter() {
            let name = subject.name().as_str();
            if out.iter().any(|o| o.label == name) {
                continue;
            }
            out.push(Self {
                label: name.to_owned(),
                target: StudyTarget::Subject {
                    id: subject.id(),
                    name: name.to_owned(),
                },
            });
        }
        out
    }
}
