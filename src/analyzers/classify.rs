use tracing::debug;

use crate::analyzers::types::{AqiBin, ClassifiedDay, DailyAggregate};
use crate::analyzers::utility::mean;
use crate::error::{PipelineError, Result};

/// Domain ceiling for the index; anything above reads as this value.
pub const AQI_CEILING: f64 = 500.0;

/// Ordered, validated severity bands.
///
/// | Range     | Level               | Color  |
/// |-----------|---------------------|--------|
/// | 0 – 50    | Excellent           | green  |
/// | 51 – 100  | Good                | yellow |
/// | 101 – 150 | Lightly Polluted    | orange |
/// | 151 – 200 | Moderately Polluted | red    |
/// | 201 – 300 | Heavily Polluted    | purple |
/// | >= 301    | Severely Polluted   | maroon |
#[derive(Debug, Clone, PartialEq)]
pub struct BinTable {
    bins: Vec<AqiBin>,
}

impl Default for BinTable {
    fn default() -> Self {
        Self {
            bins: default_bins(),
        }
    }
}

pub fn default_bins() -> Vec<AqiBin> {
    vec![
        AqiBin::new(0.0, Some(50.0), "Excellent", "green"),
        AqiBin::new(51.0, Some(100.0), "Good", "yellow"),
        AqiBin::new(101.0, Some(150.0), "Lightly Polluted", "orange"),
        AqiBin::new(151.0, Some(200.0), "Moderately Polluted", "red"),
        AqiBin::new(201.0, Some(300.0), "Heavily Polluted", "purple"),
        AqiBin::new(301.0, None, "Severely Polluted", "maroon"),
    ]
}

impl BinTable {
    /// Validates `bins` so that every value in `[0, +inf)` lands in exactly
    /// one band.
    ///
    /// Bands must start at or below zero, ascend, leave at most a one-unit
    /// gap between a band's `max` and the next `min`, carry unique labels, and
    /// end with an open band.
    pub fn new(bins: Vec<AqiBin>) -> Result<Self> {
        let invalid = |msg: String| Err(PipelineError::InvalidBinTable(msg));

        let Some(first) = bins.first() else {
            return invalid("no bins".into());
        };
        if first.min > 0.0 {
            return invalid(format!("first bin starts at {}, not 0", first.min));
        }

        let last = bins.len() - 1;
        for (i, bin) in bins.iter().enumerate() {
            if bin.min > bin.upper() {
                return invalid(format!("bin '{}' has min above max", bin.level));
            }
            if i < last && bin.max.is_none() {
                return invalid(format!("only the last bin may be open, not '{}'", bin.level));
            }
            if bins[..i].iter().any(|b| b.level == bin.level) {
                return invalid(format!("duplicate level '{}'", bin.level));
            }
            if i > 0 {
                let prev_max = bins[i - 1].upper();
                if bin.min <= prev_max || bin.min - prev_max > 1.0 {
                    return invalid(format!(
                        "bin '{}' starting at {} does not follow {}",
                        bin.level, bin.min, prev_max
                    ));
                }
            }
        }
        if bins[last].max.is_some() {
            return invalid("last bin must have an open upper bound".into());
        }

        Ok(Self { bins })
    }

    /// Bands in severity order.
    pub fn bins(&self) -> &[AqiBin] {
        &self.bins
    }

    /// Returns the band for `value`.
    ///
    /// A value between one band's `max` and the next band's `min` (such as
    /// 50.5) belongs to the higher band. The open top band takes everything
    /// past the last finite `max`, so there is no "no match" case.
    pub fn classify(&self, value: f64) -> &AqiBin {
        debug_assert!(!value.is_nan(), "NaN reached the classifier");

        let top = self.bins.len() - 1;
        let idx = self.bins[..top]
            .iter()
            .position(|bin| value <= bin.upper())
            .unwrap_or(top);
        &self.bins[idx]
    }

    /// Looks a band up by its level label.
    pub fn by_level(&self, level: &str) -> Option<&AqiBin> {
        self.bins.iter().find(|b| b.level == level)
    }
}

/// Turns daily pollutant means into an AQI and a severity level.
#[derive(Debug, Clone, PartialEq)]
pub struct AqiClassifier {
    bins: BinTable,
    ceiling: f64,
}

impl Default for AqiClassifier {
    fn default() -> Self {
        Self::new(BinTable::default(), AQI_CEILING)
    }
}

impl AqiClassifier {
    pub fn new(bins: BinTable, ceiling: f64) -> Self {
        Self { bins, ceiling }
    }

    pub fn bins(&self) -> &BinTable {
        &self.bins
    }

    /// Mean of the pollutant means, clipped from above at the ceiling.
    pub fn index(&self, means: &[f64]) -> f64 {
        let aqi = mean(means);
        if aqi > self.ceiling { self.ceiling } else { aqi }
    }

    pub fn classify_day(&self, day: DailyAggregate) -> ClassifiedDay {
        let aqi = self.index(&day.means);
        let bin = self.bins.classify(aqi);
        debug!(date = %day.date, aqi, level = %bin.level, "Classified day");

        ClassifiedDay {
            date: day.date,
            aqi,
            level: bin.level.clone(),
            color: bin.color.clone(),
            means: day.means,
        }
    }
}
