//! Run diagnostics reported alongside (never inside) the output data.

use serde::Serialize;
use tracing::warn;

use crate::conditioning::{Clipped, Repair};
use crate::parser::Coerced;

/// Per numeric column: what was missing, what was filled, what was clipped.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct NumericColumnReport {
    pub column: String,
    pub missing: usize,
    pub unparseable: usize,
    pub interpolated: usize,
    pub clipped_upper: usize,
    pub clipped_lower: usize,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

impl NumericColumnReport {
    pub fn from_coerced(column: &str, coerced: &Coerced) -> Self {
        NumericColumnReport {
            column: column.to_string(),
            missing: coerced.missing,
            unparseable: coerced.unparseable,
            interpolated: coerced.missing + coerced.unparseable,
            ..Default::default()
        }
    }

    /// Records the outcome of an outlier treatment.
    pub fn with_clipping(mut self, clipped: &Clipped) -> Self {
        self.clipped_upper = clipped.clipped_upper;
        self.clipped_lower = clipped.clipped_lower;
        self.lower_bound = clipped.bounds.lower;
        self.upper_bound = Some(clipped.bounds.upper);
        self
    }
}

/// Per categorical column repair counts.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CategoricalColumnReport {
    pub column: String,
    pub sentinels: usize,
    pub repaired: usize,
    pub blanks_filled: usize,
    pub unresolved: usize,
}

impl CategoricalColumnReport {
    pub fn from_repair(column: &str, repair: &Repair) -> Self {
        CategoricalColumnReport {
            column: column.to_string(),
            sentinels: repair.sentinels,
            repaired: repair.repaired,
            blanks_filled: repair.blanks_filled,
            unresolved: repair.unresolved,
        }
    }
}

/// Diagnostics for one pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run: String,
    pub input: Option<String>,
    pub rows: usize,
    pub days: Option<usize>,
    pub numeric: Vec<NumericColumnReport>,
    pub categorical: Vec<CategoricalColumnReport>,
    pub skipped_columns: Vec<String>,
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn new(run: &str, rows: usize) -> Self {
        RunReport {
            run: run.to_string(),
            rows,
            ..Default::default()
        }
    }

    /// Set the input the run was read from
    pub fn with_input(mut self, input: &str) -> Self {
        self.input = Some(input.to_string());
        self
    }

    /// Logs a non-fatal condition and keeps it for the report.
    pub fn warn(&mut self, message: String) {
        warn!(run = %self.run, "{message}");
        self.warnings.push(message);
    }

    /// Notes an optional target column that is not in the input.
    pub fn skip_column(&mut self, column: &str) {
        self.warn(format!("column '{column}' not found in input; skipped"));
        self.skipped_columns.push(column.to_string());
    }

    pub fn total_clipped(&self) -> usize {
        self.numeric
            .iter()
            .map(|c| c.clipped_upper + c.clipped_lower)
            .sum()
    }

    pub fn total_unresolved(&self) -> usize {
        self.categorical.iter().map(|c| c.unresolved).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditioning::{ClipBounds, Clipped};

    #[test]
    fn test_numeric_report_from_coerced() {
        let coerced = Coerced {
            values: vec![Some(1.0), None, None],
            missing: 1,
            unparseable: 1,
        };
        let report = NumericColumnReport::from_coerced("TEMP", &coerced);
        assert_eq!(report.interpolated, 2);
        assert_eq!(report.clipped_upper, 0);
    }

    #[test]
    fn test_with_clipping_records_bounds() {
        let clipped = Clipped {
            values: vec![],
            bounds: ClipBounds {
                lower: None,
                upper: 500.0,
            },
            clipped_upper: 4,
            clipped_lower: 0,
        };
        let report = NumericColumnReport::default().with_clipping(&clipped);
        assert_eq!(report.upper_bound, Some(500.0));
        assert_eq!(report.lower_bound, None);
        assert_eq!(report.clipped_upper, 4);
    }

    #[test]
    fn test_totals_and_warnings() {
        let mut report = RunReport::new("clip-sd", 10).with_input("in.csv");
        report.numeric.push(NumericColumnReport {
            clipped_upper: 2,
            clipped_lower: 1,
            ..Default::default()
        });
        report.categorical.push(CategoricalColumnReport {
            unresolved: 3,
            ..Default::default()
        });
        report.skip_column("HUMI");

        assert_eq!(report.total_clipped(), 3);
        assert_eq!(report.total_unresolved(), 3);
        assert_eq!(report.skipped_columns, vec!["HUMI"]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.input.as_deref(), Some("in.csv"));
    }
}
