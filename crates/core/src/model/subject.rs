use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::SubjectId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SubjectError {
    #[error("subject name cannot be empty")]
    EmptyName,

    #[error("subject weight must be between 1 and 5, got {0}")]
    InvalidWeight(i64),

    #[error("studied hours must be a finite, non-negative number, got {0}")]
    InvalidStudiedHours(f64),

    #[error("subject not found: {0}")]
    NotFound(String),
}

//
// ─── VALUE TYPES ───────────────────────────────────────────────────────────────
//

/// Display name of a subject. Not unique: two rows may share a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectName(String);

impl SubjectName {
    /// Create a subject name.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::EmptyName` if the name is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, SubjectError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(SubjectError::EmptyName);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relative importance of a subject in the study cycle, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Weight(u8);

impl Weight {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// # Errors
    ///
    /// Returns `SubjectError::InvalidWeight` outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, SubjectError> {
        match u8::try_from(value) {
            Ok(v) if (Self::MIN..=Self::MAX).contains(&v) => Ok(Self(v)),
            _ => Err(SubjectError::InvalidWeight(value)),
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self(3)
    }
}

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

/// One row of the subjects table.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    id: SubjectId,
    name: SubjectName,
    weight: Weight,
    studied_hours: f64,
}

impl Subject {
    /// Rehydrate a subject from stored values.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::InvalidStudiedHours` for negative or non-finite hours.
    pub fn from_persisted(
        id: SubjectId,
        name: SubjectName,
        weight: Weight,
        studied_hours: f64,
    ) -> Result<Self, SubjectError> {
        if !studied_hours.is_finite() || studied_hours < 0.0 {
            return Err(SubjectError::InvalidStudiedHours(studied_hours));
        }
        Ok(Self {
            id,
            name,
            weight,
            studied_hours,
        })
    }

    #[must_use]
    pub fn id(&self) -> SubjectId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &SubjectName {
        &self.name
    }

    #[must_use]
    pub fn weight(&self) -> Weight {
        self.weight
    }

    #[must_use]
    pub fn studied_hours(&self) -> f64 {
        self.studied_hours
    }

    /// Add `minutes / 60` hours. Returns the hours added.
    pub fn accrue_minutes(&mut self, minutes: u32) -> f64 {
        let hours = f64::from(minutes) / 60.0;
        self.studied_hours += hours;
        hours
    }
}

//
// ─── TABLE ─────────────────────────────────────────────────────────────────────
//

/// In-memory subjects table, kept in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectTable {
    rows: Vec<Subject>,
    next_id: SubjectId,
}

impl Default for SubjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SubjectTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_id: SubjectId::new(1),
        }
    }

    /// Append a row with the given values, assigning the next id.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::InvalidStudiedHours` for negative or non-finite hours.
    pub fn push_persisted(
        &mut self,
        name: SubjectName,
        weight: Weight,
        studied_hours: f64,
    ) -> Result<SubjectId, SubjectError> {
        let id = self.next_id;
        let subject = Subject::from_persisted(id, name, weight, studied_hours)?;
        self.rows.push(subject);
        self.next_id = id.next();
        Ok(id)
    }

    /// Append a brand-new subject with zero studied hours.
    ///
    /// Duplicate names are accepted and produce distinct rows.
    pub fn add(&mut self, name: SubjectName, weight: Weight) -> SubjectId {
        let id = self.next_id;
        self.rows.push(Subject {
            id,
            name,
            weight,
            studied_hours: 0.0,
        });
        self.next_id = id.next();
        id
    }

    #[must_use]
    pub fn get(&self, id: SubjectId) -> Option<&Subject> {
        self.rows.iter().find(|s| s.id == id)
    }

    /// First row whose name equals `name` exactly, in insertion order.
    #[must_use]
    pub fn first_by_name(&self, name: &str) -> Option<&Subject> {
        self.rows.iter().find(|s| s.name.as_str() == name)
    }

    /// Add studied time to the subject with the given id.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::NotFound` if no row has that id.
    pub fn accrue_minutes(&mut self, id: SubjectId, minutes: u32) -> Result<f64, SubjectError> {
        let subject = self
            .rows
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SubjectError::NotFound(id.to_string()))?;
        Ok(subject.accrue_minutes(minutes))
    }

    #[must_use]
    pub fn rows(&self) -> &[Subject] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.rows.iter()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> SubjectName {
        SubjectName::new(s).unwrap()
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(SubjectName::new(""), Err(SubjectError::EmptyName));
        assert_eq!(SubjectName::new("   "), Err(SubjectError::EmptyName));
        assert_eq!(name("Math").as_str(), "Math");
    }

    #[test]
    fn weight_bounds() {
        assert!(Weight::new(0).is_err());
        assert!(Weight::new(6).is_err());
        assert!(Weight::new(-1).is_err());
        assert_eq!(Weight::new(1).unwrap().value(), 1);
        assert_eq!(Weight::new(5).unwrap().value(), 5);
        assert_eq!(Weight::default().value(), 3);
    }

    #[test]
    fn add_starts_at_zero_hours() {
        let mut table = SubjectTable::new();
        let id = table.add(name("Math"), Weight::new(4).unwrap());
        let subject = table.get(id).unwrap();
        assert_eq!(subject.name().as_str(), "Math");
        assert_eq!(subject.weight().value(), 4);
        assert_eq!(subject.studied_hours(), 0.0);
    }

    #[test]
    fn duplicate_names_get_distinct_ids() {
        let mut table = SubjectTable::new();
        let first = table.add(name("Math"), Weight::default());
        let second = table.add(name("Math"), Weight::default());
        assert_ne!(first, second);
        assert_eq!(table.len(), 2);
        assert_eq!(table.first_by_name("Math").unwrap().id(), first);
    }

    #[test]
    fn accrue_updates_only_target_row() {
        let mut table = SubjectTable::new();
        let first = table.add(name("Math"), Weight::default());
        let second = table.add(name("Math"), Weight::default());

        let added = table.accrue_minutes(second, 90).unwrap();
        assert!((added - 1.5).abs() < 1e-9);
        assert_eq!(table.get(first).unwrap().studied_hours(), 0.0);
        assert!((table.get(second).unwrap().studied_hours() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn accrue_unknown_id_fails() {
        let mut table = SubjectTable::new();
        let err = table.accrue_minutes(SubjectId::new(9), 10).unwrap_err();
        assert!(matches!(err, SubjectError::NotFound(_)));
    }

    #[test]
    fn persisted_hours_are_validated() {
        let mut table = SubjectTable::new();
        assert!(
            table
                .push_persisted(name("Bio"), Weight::default(), -1.0)
                .is_err()
        );
        assert!(
            table
                .push_persisted(name("Bio"), Weight::default(), f64::NAN)
                .is_err()
        );
        let id = table
            .push_persisted(name("Bio"), Weight::default(), 2.25)
            .unwrap();
        assert_eq!(id, SubjectId::new(1));
        assert_eq!(table.add(name("Chem"), Weight::default()), SubjectId::new(2));
    }
}
