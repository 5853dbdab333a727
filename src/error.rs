//! Error taxonomy for the conditioning pipeline.
//!
//! Fatal conditions are variants of [`PipelineError`] and abort a run.
//! Non-fatal conditions (unresolved wind readings, constant columns under the
//! `nan` scale policy, skipped optional columns) never appear here; they are
//! tallied in [`crate::stats::RunReport`] instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("required column '{column}' is missing from the input")]
    Schema { column: String },

    #[error("input file '{}' could not be read: {source}", path.display())]
    MissingInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("column '{column}' has no parseable values; interpolation is impossible")]
    DegenerateSeries { column: String },

    #[error("column '{column}' is constant; {method} normalization would divide by zero")]
    DegenerateScale {
        column: String,
        method: &'static str,
    },

    #[error("row {row}: invalid calendar date {year}-{month}-{day}")]
    InvalidDate {
        row: usize,
        year: String,
        month: String,
        day: String,
    },

    #[error("no pollutant columns configured for the {run} run")]
    NoColumns { run: &'static str },

    #[error("invalid AQI bin table: {0}")]
    InvalidBinTable(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
