//! Outlier treatment.
//!
//! Both strategies replace an offending value with the bound it crossed and
//! never drop a record. [`OutlierTreatment`] lets the pipeline run either one
//! over a set of columns.

use crate::analyzers::utility::{mean, sample_stddev};

/// Bounds applied by a treatment. `lower` is `None` for one-sided caps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipBounds {
    pub lower: Option<f64>,
    pub upper: f64,
}

/// A treated series with per-side replacement counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Clipped {
    pub values: Vec<f64>,
    pub bounds: ClipBounds,
    pub clipped_upper: usize,
    pub clipped_lower: usize,
}

impl Clipped {
    pub fn total(&self) -> usize {
        self.clipped_upper + self.clipped_lower
    }
}

/// A strategy for capping extreme values in a fully populated series.
pub trait OutlierTreatment: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Works out the bounds for `values`, from the untreated values only.
    fn bounds(&self, values: &[f64]) -> ClipBounds;

    fn treat(&self, values: &[f64]) -> Clipped {
        clip_to(values, self.bounds(values))
    }
}

/// Replaces values above `bounds.upper` (and below `bounds.lower`, if any).
pub fn clip_to(values: &[f64], bounds: ClipBounds) -> Clipped {
    let mut clipped_upper = 0;
    let mut clipped_lower = 0;

    let values = values
        .iter()
        .map(|&v| {
            if v > bounds.upper {
                clipped_upper += 1;
                bounds.upper
            } else {
                match bounds.lower {
                    Some(lower) if v < lower => {
                        clipped_lower += 1;
                        lower
                    }
                    _ => v,
                }
            }
        })
        .collect();

    Clipped {
        values,
        bounds,
        clipped_upper,
        clipped_lower,
    }
}

/// Caps at `mean ± sigmas * stddev`, using the sample standard deviation of
/// the whole series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalClipper {
    pub sigmas: f64,
}

impl Default for StatisticalClipper {
    fn default() -> Self {
        Self { sigmas: 3.0 }
    }
}

impl OutlierTreatment for StatisticalClipper {
    fn name(&self) -> &'static str {
        "statistical"
    }

    fn bounds(&self, values: &[f64]) -> ClipBounds {
        let mu = mean(values);
        let sd = sample_stddev(values, mu);
        ClipBounds {
            lower: Some(mu - self.sigmas * sd),
            upper: mu + self.sigmas * sd,
        }
    }
}

/// Caps at a fixed maximum. Concentrations have no lower bound here, so
/// negative readings pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedBoundClipper {
    pub cap: f64,
}

impl FixedBoundClipper {
    pub fn new(cap: f64) -> Self {
        Self { cap }
    }
}

impl OutlierTreatment for FixedBoundClipper {
    fn name(&self) -> &'static str {
        "fixed-bound"
    }

    fn bounds(&self, _values: &[f64]) -> ClipBounds {
        ClipBounds {
            lower: None,
            upper: self.cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spiky() -> Vec<f64> {
        let mut values = vec![10.0; 30];
        values[5] = 1000.0;
        values[20] = -1000.0;
        values
    }

    #[test]
    fn test_statistical_clip_stays_within_pre_clip_bounds() {
        let input = spiky();
        let mu = mean(&input);
        let sd = sample_stddev(&input, mu);

        let clipped = StatisticalClipper::default().treat(&input);

        for v in &clipped.values {
            assert!(*v <= mu + 3.0 * sd);
            assert!(*v >= mu - 3.0 * sd);
        }
        assert_eq!(clipped.clipped_upper, 1);
        assert_eq!(clipped.clipped_lower, 1);
        assert_eq!(clipped.values[5], mu + 3.0 * sd);
        assert_eq!(clipped.values[20], mu - 3.0 * sd);
        assert_eq!(clipped.values.len(), input.len());
    }

    #[test]
    fn test_statistical_clip_leaves_inliers_alone() {
        let input = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let clipped = StatisticalClipper::default().treat(&input);
        assert_eq!(clipped.values, input);
        assert_eq!(clipped.total(), 0);
    }

    #[test]
    fn test_fixed_bound_caps_only_above() {
        let input = vec![-5.0, 120.0, 500.0, 501.0, 980.0];
        let clipped = FixedBoundClipper::new(500.0).treat(&input);

        assert_eq!(clipped.values, vec![-5.0, 120.0, 500.0, 500.0, 500.0]);
        assert_eq!(clipped.clipped_upper, 2);
        assert_eq!(clipped.clipped_lower, 0);
        assert_eq!(clipped.bounds.lower, None);
    }

    #[test]
    fn test_fixed_bound_output_never_exceeds_cap() {
        let input: Vec<f64> = (0..50).map(|i| i as f64 * 17.3).collect();
        let clipped = FixedBoundClipper::new(400.0).treat(&input);

        for (before, after) in input.iter().zip(&clipped.values) {
            assert!(*after <= 400.0);
            if *before <= 400.0 {
                assert_eq!(before, after);
            }
        }
    }
}
