//! CSV parser for hourly observation tables.
//!
//! The table is kept as raw strings so untouched columns round-trip verbatim;
//! typed views (numeric series, calendar dates) are produced on demand.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Cell contents read as "missing" before any numeric parse is attempted.
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "NULL", "null", "#N/A", "<NA>",
];

/// Returns `true` if the cell holds one of the [`MISSING_TOKENS`].
pub fn is_missing_token(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell.trim())
}

/// A raw table: header row plus string cells in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Borrows every cell of `name` in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name).ok_or_else(|| PipelineError::Schema {
            column: name.to_string(),
        })?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Replaces the cells of `name`, or appends it as a new last column.
    pub fn with_column(mut self, name: &str, cells: Vec<String>) -> Self {
        debug_assert_eq!(cells.len(), self.rows.len());

        match self.column_index(name) {
            Some(idx) => {
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row[idx] = cell;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            }
        }
        self
    }
}

/// Reads a table from `path`, gunzipping it first when the name ends in `.gz`.
///
/// # Errors
///
/// Returns [`PipelineError::MissingInput`] if the file cannot be opened, and
/// [`PipelineError::Csv`] if the contents are not a well-formed CSV.
pub fn load_table(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|source| PipelineError::MissingInput {
        path: path.to_path_buf(),
        source,
    })?;

    let gzipped = path.extension().and_then(|e| e.to_str()) == Some("gz");
    debug!(path = %path.display(), gzipped, "Loading table");

    if gzipped {
        parse_table(GzDecoder::new(file))
    } else {
        parse_table(file)
    }
}

/// Parses CSV text with a header row into a [`Table`].
pub fn parse_table<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(headers, rows))
}

/// Confirms every name in `required` is a column of `table`.
///
/// Fails on the first absent name, before any transform has touched the data.
pub fn require_columns<S: AsRef<str>>(table: &Table, required: &[S]) -> Result<()> {
    for name in required {
        let name = name.as_ref();
        if !table.has_column(name) {
            return Err(PipelineError::Schema {
                column: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Parses a single cell. Missing tokens, unparseable text and non-finite
/// numbers all become `None`.
pub fn parse_numeric_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if is_missing_token(cell) {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A numeric view of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub values: Vec<Option<f64>>,
    /// Cells that were already empty or a missing token.
    pub missing: usize,
    /// Cells that held text which did not parse as a finite number.
    pub unparseable: usize,
}

/// Converts column `name` to float-or-missing. Never fails on cell contents;
/// only an absent column is an error.
pub fn coerce_numeric(table: &Table, name: &str) -> Result<Coerced> {
    let cells = table.column(name)?;

    let mut missing = 0;
    let mut unparseable = 0;
    let values = cells
        .iter()
        .map(|cell| {
            let parsed = parse_numeric_cell(cell);
            if parsed.is_none() {
                if is_missing_token(cell) {
                    missing += 1;
                } else {
                    unparseable += 1;
                }
            }
            parsed
        })
        .collect();

    Ok(Coerced {
        values,
        missing,
        unparseable,
    })
}

/// Builds the calendar date of every row from its year/month/day columns.
pub fn parse_dates(table: &Table, year: &str, month: &str, day: &str) -> Result<Vec<NaiveDate>> {
    let years = table.column(year)?;
    let months = table.column(month)?;
    let days = table.column(day)?;

    years
        .iter()
        .zip(&months)
        .zip(&days)
        .enumerate()
        .map(|(row, ((y, m), d))| {
            let date = match (
                y.trim().parse::<i32>(),
                m.trim().parse::<u32>(),
                d.trim().parse::<u32>(),
            ) {
                (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
                _ => None,
            };

            date.ok_or_else(|| PipelineError::InvalidDate {
                row: row + 1,
                year: y.to_string(),
                month: m.to_string(),
                day: d.to_string(),
            })
        })
        .collect()
}
