//! Pipeline configuration.
//!
//! Every field has a default matching the Beijing hourly PM2.5 dataset, so a
//! config file only needs the fields it changes:
//! ```json
//! {
//!   "pm_cap": 400,
//!   "stat_columns": ["HUMI", "PRES"],
//!   "degenerate_scale": "nan"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::classify::{AQI_CEILING, AqiClassifier, BinTable, default_bins};
use crate::analyzers::types::AqiBin;
use crate::conditioning::{FixedBoundClipper, ScalePolicy, StatisticalClipper};
use crate::error::Result;

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub year_column: String,
    pub month_column: String,
    pub day_column: String,

    /// Pollutant columns averaged into the daily AQI.
    pub aqi_columns: Vec<String>,
    pub aqi_ceiling: f64,
    pub levels: Vec<AqiBin>,

    /// Columns capped at `pm_cap`.
    pub cap_columns: Vec<String>,
    pub pm_cap: f64,

    /// Columns clipped at mean ± `sigmas` standard deviations.
    pub stat_columns: Vec<String>,
    pub sigmas: f64,

    pub wind_column: String,
    pub wind_sentinel: String,

    pub normalize_columns: Vec<String>,
    pub degenerate_scale: ScalePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            year_column: "year".into(),
            month_column: "month".into(),
            day_column: "day".into(),
            aqi_columns: strings(&["PM_Dongsi", "PM_Dongsihuan", "PM_Nongzhanguan", "PM_US Post"]),
            aqi_ceiling: AQI_CEILING,
            levels: default_bins(),
            cap_columns: strings(&["PM_Dongsi", "PM_Dongsihuan", "PM_Nongzhanguan"]),
            pm_cap: 500.0,
            stat_columns: strings(&["HUMI", "PRES", "TEMP"]),
            sigmas: 3.0,
            wind_column: "cbwd".into(),
            wind_sentinel: "cv".into(),
            normalize_columns: strings(&["DEWP", "TEMP"]),
            degenerate_scale: ScalePolicy::Fail,
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "Loaded pipeline config");
        Ok(config)
    }

    /// Builds the classifier, validating the configured bands.
    pub fn classifier(&self) -> Result<AqiClassifier> {
        let bins = BinTable::new(self.levels.clone())?;
        Ok(AqiClassifier::new(bins, self.aqi_ceiling))
    }

    pub fn statistical_clipper(&self) -> StatisticalClipper {
        StatisticalClipper {
            sigmas: self.sigmas,
        }
    }

    pub fn fixed_clipper(&self) -> FixedBoundClipper {
        FixedBoundClipper::new(self.pm_cap)
    }

    /// Columns the tally run cannot do without.
    pub fn aqi_required_columns(&self) -> Vec<String> {
        let mut required = vec![
            self.year_column.clone(),
            self.month_column.clone(),
            self.day_column.clone(),
        ];
        required.extend(self.aqi_columns.iter().cloned());
        required
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "pm_cap": 400, "degenerate_scale": "nan" }"#).unwrap();
        assert_eq!(config.pm_cap, 400.0);
        assert_eq!(config.degenerate_scale, ScalePolicy::Nan);
        assert_eq!(config.wind_sentinel, "cv");
        assert_eq!(config.levels.len(), 6);
    }

    #[test]
    fn test_levels_from_json() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{ "levels": [
                { "min": 0, "max": 100, "level": "ok", "color": "green" },
                { "min": 101, "level": "bad", "color": "red" }
            ] }"#,
        )
        .unwrap();
        let classifier = config.classifier().unwrap();
        assert_eq!(classifier.bins().classify(250.0).level, "bad");
    }

    #[test]
    fn test_invalid_levels_are_rejected() {
        let mut config = PipelineConfig::default();
        config.levels.truncate(3);
        assert!(matches!(config.classifier(), Err(PipelineError::InvalidBinTable(_))));
    }

    #[test]
    fn test_load_roundtrips_through_file() {
        let path = std::env::temp_dir().join("aqi_pipeline_test_config.json");
        std::fs::write(&path, r#"{ "sigmas": 2.5, "stat_columns": ["TEMP"] }"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.sigmas, 2.5);
        assert_eq!(config.stat_columns, vec!["TEMP"]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_aqi_required_columns() {
        let required = PipelineConfig::default().aqi_required_columns();
        assert_eq!(required[..3], ["year", "month", "day"]);
        assert_eq!(required.len(), 7);
    }
}
