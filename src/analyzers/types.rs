//! Data types used by the aggregation and classification pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One hourly observation reduced to its calendar date and the target values,
/// in the order of the target columns.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRecord {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

/// Per-date means of the target columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub means: Vec<f64>,
    /// Number of hourly records folded into this date.
    pub hours: usize,
}

/// A [`DailyAggregate`] with its AQI and severity level attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedDay {
    pub date: NaiveDate,
    pub means: Vec<f64>,
    pub aqi: f64,
    pub level: String,
    pub color: String,
}

/// One severity band of the AQI scale.
///
/// `max = None` marks the open-ended top band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiBin {
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
    pub level: String,
    pub color: String,
}

impl AqiBin {
    pub fn new(min: f64, max: Option<f64>, level: &str, color: &str) -> Self {
        Self {
            min,
            max,
            level: level.to_string(),
            color: color.to_string(),
        }
    }

    /// Upper bound, `+inf` for the open band.
    pub fn upper(&self) -> f64 {
        self.max.unwrap_or(f64::INFINITY)
    }

    /// Inclusive `min <= value <= max` test.
    #[cfg(test)]
    pub(crate) fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.upper()
    }
}

/// One row of the level tally output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelCount {
    #[serde(rename = "AQI_Level")]
    pub level: String,
    #[serde(rename = "Number_of_Days")]
    pub days: usize,
    pub color: String,
}
