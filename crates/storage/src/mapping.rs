//! Logical table schemas and the mapping between CSV tables and domain tables.

use chrono::NaiveDate;
use study_core::model::{
    ReviewLog, ReviewRecord, SubjectError, SubjectName, SubjectTable, Weight,
};
use thiserror::Error;

use crate::table::{CsvTable, TableError};

/// Remote path of the subjects table.
pub const SUBJECTS_PATH: &str = "subjects.csv";
/// Remote path of the reviews table.
pub const REVIEWS_PATH: &str = "reviews.csv";

pub const SUBJECT_COLUMNS: [&str; 3] = ["Subject", "Weight", "StudiedHours"];
pub const REVIEW_COLUMNS: [&str; 4] = ["Date", "Subject", "Topic", "NextReviewDate"];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MappingError {
    #[error("missing column {0}")]
    MissingColumn(&'static str),

    #[error("row {row}: invalid {column} value {value:?}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: {source}")]
    Subject {
        row: usize,
        #[source]
        source: SubjectError,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

struct Columns<const N: usize>([usize; N]);

impl<const N: usize> Columns<N> {
    fn resolve(table: &CsvTable, names: &[&'static str; N]) -> Result<Self, MappingError> {
        let mut idx = [0; N];
        for (slot, name) in idx.iter_mut().zip(names) {
            *slot = table
                .column_index(name)
                .ok_or(MappingError::MissingColumn(*name))?;
        }
        Ok(Self(idx))
    }
}

fn invalid(row: usize, column: &'static str, value: &str) -> MappingError {
    MappingError::InvalidValue {
        row,
        column,
        value: value.to_owned(),
    }
}

/// Weights may have been written as floats (`4.0`) by other tools.
#[allow(clippy::cast_possible_truncation)]
fn parse_weight(row: usize, raw: &str) -> Result<Weight, MappingError> {
    let raw = raw.trim();
    let value = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f: f64 = raw.parse().map_err(|_| invalid(row, "Weight", raw))?;
            if f.fract() != 0.0 || !f.is_finite() {
                return Err(invalid(row, "Weight", raw));
            }
            f as i64
        }
    };
    Weight::new(value).map_err(|source| MappingError::Subject { row, source })
}

fn parse_date(row: usize, column: &'static str, raw: &str) -> Result<NaiveDate, MappingError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| invalid(row, column, raw))
}

/// Build a subjects table from its CSV form. Ids are assigned in row order.
///
/// # Errors
///
/// Returns `MappingError` if a column is missing or any cell fails to parse.
pub fn subjects_from_table(table: &CsvTable) -> Result<SubjectTable, MappingError> {
    let Columns([name_ix, weight_ix, hours_ix]) = Columns::resolve(table, &SUBJECT_COLUMNS)?;

    let mut out = SubjectTable::new();
    for (row, cells) in table.rows().iter().enumerate() {
        let name = SubjectName::new(cells[name_ix].clone())
            .map_err(|source| MappingError::Subject { row, source })?;
        let weight = parse_weight(row, &cells[weight_ix])?;
        let raw_hours = cells[hours_ix].trim();
        let hours: f64 = raw_hours
            .parse()
            .map_err(|_| invalid(row, "StudiedHours", raw_hours))?;
        out.push_persisted(name, weight, hours)
            .map_err(|source| MappingError::Subject { row, source })?;
    }
    Ok(out)
}

/// # Errors
///
/// Returns `MappingError::Table` if a row cannot be added.
pub fn subjects_to_table(subjects: &SubjectTable) -> Result<CsvTable, MappingError> {
    let mut table = CsvTable::empty(&SUBJECT_COLUMNS);
    for subject in subjects.iter() {
        table.push_row(vec![
            subject.name().as_str().to_owned(),
            subject.weight().value().to_string(),
            format_hours(subject.studied_hours()),
        ])?;
    }
    Ok(table)
}

/// Shortest representation that parses back to the same value, always
/// with a decimal point.
fn format_hours(hours: f64) -> String {
    let text = hours.to_string();
    if text.contains('.') || text.contains('e') {
        text
    } else {
        format!("{text}.0")
    }
}

/// # Errors
///
/// Returns `MappingError` if a column is missing or a date fails to parse.
pub fn reviews_from_table(table: &CsvTable) -> Result<ReviewLog, MappingError> {
    let Columns([date_ix, subject_ix, topic_ix, next_ix]) =
        Columns::resolve(table, &REVIEW_COLUMNS)?;

    let mut records = Vec::with_capacity(table.rows().len());
    for (row, cells) in table.rows().iter().enumerate() {
        records.push(ReviewRecord {
            date: parse_date(row, "Date", &cells[date_ix])?,
            subject: cells[subject_ix].clone(),
            topic: cells[topic_ix].clone(),
            next_review_date: parse_date(row, "NextReviewDate", &cells[next_ix])?,
        });
    }
    Ok(ReviewLog::from_records(records))
}

/// # Errors
///
/// Returns `MappingError::Table` if a row cannot be added.
pub fn reviews_to_table(reviews: &ReviewLog) -> Result<CsvTable, MappingError> {
    let mut table = CsvTable::empty(&REVIEW_COLUMNS);
    for r in reviews.records() {
        table.push_row(vec![
            r.date.format(DATE_FORMAT).to_string(),
            r.subject.clone(),
            r.topic.clone(),
            r.next_review_date.format(DATE_FORMAT).to_string(),
        ])?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subjects_roundtrip_keeps_order_and_hours() {
        let mut subjects = SubjectTable::new();
        let math = subjects.add(SubjectName::new("Math").unwrap(), Weight::new(4).unwrap());
        subjects.add(SubjectName::new("Bio, cells").unwrap(), Weight::new(2).unwrap());
        subjects.accrue_minutes(math, 1).unwrap();

        let csv = subjects_to_table(&subjects).unwrap();
        assert_eq!(csv.rows()[0][2], (1.0_f64 / 60.0).to_string());
        assert_eq!(csv.rows()[1][2], "0.0");

        let text = csv.to_csv_string().unwrap();
        let back = subjects_from_table(&CsvTable::parse(&text).unwrap()).unwrap();
        assert_eq!(back, subjects);
    }

    #[test]
    fn subject_columns_may_be_reordered() {
        let table = CsvTable::parse("StudiedHours,Subject,Weight\n1.5,Math,4.0\n").unwrap();
        let subjects = subjects_from_table(&table).unwrap();
        let math = &subjects.rows()[0];
        assert_eq!(math.name().as_str(), "Math");
        assert_eq!(math.weight().value(), 4);
        assert!((math.studied_hours() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_subject_cells_fail() {
        let missing = CsvTable::parse("Subject,Weight\nMath,4\n").unwrap();
        assert!(matches!(
            subjects_from_table(&missing),
            Err(MappingError::MissingColumn("StudiedHours"))
        ));

        let bad_weight = CsvTable::parse("Subject,Weight,StudiedHours\nMath,9,0\n").unwrap();
        assert!(matches!(
            subjects_from_table(&bad_weight),
            Err(MappingError::Subject { row: 0, .. })
        ));

        let bad_hours = CsvTable::parse("Subject,Weight,StudiedHours\nMath,3,lots\n").unwrap();
        assert!(matches!(
            subjects_from_table(&bad_hours),
            Err(MappingError::InvalidValue {
                column: "StudiedHours",
                ..
            })
        ));
    }

    #[test]
    fn reviews_roundtrip_iso_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let log = ReviewLog::from_records(vec![
            ReviewRecord::scheduled(today, "Math", "Derivatives"),
            ReviewRecord::scheduled(today, "Gone", ""),
        ]);

        let csv = reviews_to_table(&log).unwrap();
        assert_eq!(
            csv.rows()[0],
            vec!["2024-03-09", "Math", "Derivatives", "2024-03-10"]
        );
        assert_eq!(reviews_from_table(&csv).unwrap(), log);
    }

    #[test]
    fn bad_review_date_fails() {
        let table =
            CsvTable::parse("Date,Subject,Topic,NextReviewDate\nyesterday,Math,x,2024-01-01\n")
                .unwrap();
        assert!(matches!(
            reviews_from_table(&table),
            Err(MappingError::InvalidValue { column: "Date", .. })
        ));
    }
}
