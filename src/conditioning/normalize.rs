//! Whole-series rescaling for visualization.

use serde::{Deserialize, Serialize};

use crate::analyzers::utility::{mean, sample_stddev};

/// Marker returned when a series has zero range or zero variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegenerateScale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMethod {
    MinMax,
    ZScore,
}

impl ScaleMethod {
    pub const ALL: [ScaleMethod; 2] = [ScaleMethod::MinMax, ScaleMethod::ZScore];

    pub fn label(self) -> &'static str {
        match self {
            ScaleMethod::MinMax => "min-max",
            ScaleMethod::ZScore => "z-score",
        }
    }

    /// Column name suffix for the appended output column.
    pub fn suffix(self) -> &'static str {
        match self {
            ScaleMethod::MinMax => "MinMax",
            ScaleMethod::ZScore => "ZScore",
        }
    }

    pub fn apply(self, values: &[f64]) -> Result<Vec<f64>, DegenerateScale> {
        match self {
            ScaleMethod::MinMax => min_max(values),
            ScaleMethod::ZScore => z_score(values),
        }
    }
}

/// What to do when a column cannot be rescaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalePolicy {
    /// Abort the run.
    #[default]
    Fail,
    /// Emit an all-NaN column and record a warning.
    Nan,
}

/// `(x - min) / (max - min)` over the whole series.
pub fn min_max(values: &[f64]) -> Result<Vec<f64>, DegenerateScale> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range == 0.0 {
        return Err(DegenerateScale);
    }

    Ok(values.iter().map(|v| (v - min) / range).collect())
}

/// `(x - mean) / stddev` using the sample standard deviation.
pub fn z_score(values: &[f64]) -> Result<Vec<f64>, DegenerateScale> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let mu = mean(values);
    let sd = sample_stddev(values, mu);
    if sd == 0.0 {
        return Err(DegenerateScale);
    }

    Ok(values.iter().map(|v| (v - mu) / sd).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max_spans_unit_interval() {
        let scaled = min_max(&[-3.0, 7.0, 2.0, 12.0]).unwrap();
        assert_eq!(scaled, vec![0.0, 10.0 / 15.0, 5.0 / 15.0, 1.0]);

        let lo = scaled.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(lo, 0.0);
        assert_eq!(hi, 1.0);
    }

    #[test]
    fn test_min_max_constant_is_degenerate() {
        assert_eq!(min_max(&[4.0, 4.0, 4.0]), Err(DegenerateScale));
    }

    #[test]
    fn test_z_score_has_zero_mean_and_unit_sample_stddev() {
        let scaled = z_score(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        let mu = mean(&scaled);
        let sd = sample_stddev(&scaled, mu);
        assert!(mu.abs() < 1e-12);
        assert!((sd - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_z_score_constant_is_degenerate() {
        assert_eq!(z_score(&[1.5, 1.5]), Err(DegenerateScale));
        assert_eq!(z_score(&[1.5]), Err(DegenerateScale));
    }

    #[test]
    fn test_policy_deserializes_from_snake_case() {
        let policy: ScalePolicy = serde_json::from_str("\"nan\"").unwrap();
        assert_eq!(policy, ScalePolicy::Nan);
    }
}
