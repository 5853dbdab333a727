//! Daily aggregation and air-quality classification.
//!
//! Hourly pollutant readings are averaged per calendar date, the daily means
//! are folded into a single index, the index is placed in a severity band,
//! and the bands are tallied.

pub mod aggregate;
pub mod classify;
pub mod tally;
pub mod types;
pub mod utility;
