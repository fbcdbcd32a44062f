//! Untyped CSV tables: a header row and string cells.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TableError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("csv output is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("csv writer could not be flushed: {0}")]
    Flush(String),

    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A flat table as stored in one CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// An empty table with the given schema.
    #[must_use]
    pub fn empty(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// Returns `TableError::RowWidth` if a row does not match the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        let table = Self {
            columns,
            rows: Vec::with_capacity(rows.len()),
        };
        rows.into_iter().try_fold(table, |mut t, row| {
            t.push_row(row)?;
            Ok(t)
        })
    }

    /// # Errors
    ///
    /// Returns `TableError::RowWidth` if the row does not match the column count.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn has_columns(&self, expected: &[&str]) -> bool {
        self.columns.len() == expected.len()
            && self.columns.iter().zip(expected).all(|(a, b)| a == b)
    }

    /// Parse CSV text with a header row.
    ///
    /// # Errors
    ///
    /// Returns `TableError::Csv` for malformed input, including rows whose
    /// width differs from the header.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_owned).collect());
        }
        Ok(Self { columns, rows })
    }

    /// Serialize to CSV text: header line, then one line per row.
    ///
    /// # Errors
    ///
    /// Returns `TableError` if the writer fails.
    pub fn to_csv_string(&self) -> Result<String, TableError> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| TableError::Flush(e.to_string()))?;
        Ok(String::from_utf8(bytes)?)
    }
}
