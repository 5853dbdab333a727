//! End-to-end runs.
//!
//! Each run takes an immutable [`Table`] and returns a new product plus a
//! [`RunReport`]. Fatal conditions come back as [`PipelineError`]; everything
//! else is tallied in the report.

use rayon::prelude::*;
use tracing::info;

use crate::analyzers::aggregate::aggregate_daily;
use crate::analyzers::tally::tally_levels;
use crate::analyzers::types::{ClassifiedDay, HourlyRecord, LevelCount};
use crate::conditioning::{
    Category, OutlierTreatment, ScaleMethod, ScalePolicy, backfill, interpolate_linear,
};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::output::format_column;
use crate::parser::{Table, coerce_numeric, parse_dates, require_columns};
use crate::stats::{CategoricalColumnReport, NumericColumnReport, RunReport};

/// Output of the AQI tally run.
#[derive(Debug, Clone)]
pub struct AqiRun {
    pub days: Vec<ClassifiedDay>,
    pub tally: Vec<LevelCount>,
    pub report: RunReport,
}

/// Output of the table-rewriting runs.
#[derive(Debug, Clone)]
pub struct TableRun {
    pub table: Table,
    pub report: RunReport,
}

/// Coerces and interpolates one column.
fn fill_column(table: &Table, column: &str) -> Result<(Vec<f64>, NumericColumnReport)> {
    let coerced = coerce_numeric(table, column)?;
    let filled = interpolate_linear(&coerced.values).map_err(|_| PipelineError::DegenerateSeries {
        column: column.to_string(),
    })?;
    Ok((filled, NumericColumnReport::from_coerced(column, &coerced)))
}

/// Daily AQI levels and their tally.
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn run_aqi_tally(table: &Table, config: &PipelineConfig) -> Result<AqiRun> {
    let classifier = config.classifier()?;
    if config.aqi_columns.is_empty() {
        return Err(PipelineError::NoColumns { run: "tally" });
    }
    require_columns(table, &config.aqi_required_columns())?;

    let mut report = RunReport::new("tally", table.len());

    let mut columns = Vec::with_capacity(config.aqi_columns.len());
    for name in &config.aqi_columns {
        let (filled, col_report) = fill_column(table, name)?;
        columns.push(filled);
        report.numeric.push(col_report);
    }

    let dates = parse_dates(
        table,
        &config.year_column,
        &config.month_column,
        &config.day_column,
    )?;

    let records: Vec<HourlyRecord> = dates
        .into_iter()
        .enumerate()
        .map(|(row, date)| HourlyRecord {
            date,
            values: columns.iter().map(|c| c[row]).collect(),
        })
        .collect();

    let days: Vec<ClassifiedDay> = aggregate_daily(&records)
        .into_iter()
        .map(|day| classifier.classify_day(day))
        .collect();
    let tally = tally_levels(&days, classifier.bins());

    report.days = Some(days.len());
    info!(days = days.len(), levels = tally.len(), "AQI tally complete");

    Ok(AqiRun {
        days,
        tally,
        report,
    })
}

/// Runs `treatment` over every present column in `columns`, one column per
/// rayon task. Absent columns are skipped with a warning.
fn treat_columns<T: OutlierTreatment>(
    table: &Table,
    columns: &[String],
    treatment: &T,
    mut report: RunReport,
) -> Result<TableRun> {
    let present: Vec<&String> = columns.iter().filter(|c| table.has_column(c)).collect();
    for missing in columns.iter().filter(|c| !table.has_column(c)) {
        report.skip_column(missing);
    }

    let treated = present
        .par_iter()
        .map(|column| -> Result<_> {
            let (filled, col_report) = fill_column(table, column)?;
            let clipped = treatment.treat(&filled);
            info!(
                column = %column,
                strategy = treatment.name(),
                outliers = clipped.total(),
                "Treated outliers"
            );
            let col_report = col_report.with_clipping(&clipped);
            Ok((column.as_str(), clipped.values, col_report))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = table.clone();
    for (column, values, col_report) in treated {
        out = out.with_column(column, format_column(&values));
        report.numeric.push(col_report);
    }

    Ok(TableRun { table: out, report })
}

/// Clips the statistical columns at mean ± k standard deviations.
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn run_statistical_clip(table: &Table, config: &PipelineConfig) -> Result<TableRun> {
    let report = RunReport::new("clip-sd", table.len());
    treat_columns(table, &config.stat_columns, &config.statistical_clipper(), report)
}

/// Caps the PM columns at the fixed concentration maximum.
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn run_fixed_cap(table: &Table, config: &PipelineConfig) -> Result<TableRun> {
    let report = RunReport::new("cap-pm", table.len());
    treat_columns(table, &config.cap_columns, &config.fixed_clipper(), report)
}

/// Back-fills the wind-direction sentinel.
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn run_wind_repair(table: &Table, config: &PipelineConfig) -> Result<TableRun> {
    let column = config.wind_column.as_str();
    let sentinel = config.wind_sentinel.as_str();
    require_columns(table, &[column])?;

    let mut report = RunReport::new("repair-wind", table.len());

    let values: Vec<Category> = table
        .column(column)?
        .iter()
        .map(|cell| Category::parse(cell, sentinel))
        .collect();
    let repair = backfill(&values);

    if repair.sentinels == 0 {
        info!(column, sentinel, "No sentinel values to replace");
        // Nothing is written back, so no blank counts as filled.
        let unchanged = CategoricalColumnReport {
            blanks_filled: 0,
            ..CategoricalColumnReport::from_repair(column, &repair)
        };
        report.categorical.push(unchanged);
        return Ok(TableRun {
            table: table.clone(),
            report,
        });
    }

    report
        .categorical
        .push(CategoricalColumnReport::from_repair(column, &repair));
    info!(
        column,
        sentinels = repair.sentinels,
        repaired = repair.repaired,
        "Back-filled sentinels"
    );
    if repair.unresolved > 0 {
        report.warn(format!(
            "{} '{sentinel}' values in '{column}' have no later reading and were kept",
            repair.unresolved
        ));
    }

    // Only replaced cells are rendered; every other cell keeps its text.
    let cells: Vec<String> = repair
        .values
        .iter()
        .zip(&values)
        .zip(table.column(column)?)
        .map(|((after, before), original)| {
            if after == before {
                original.to_string()
            } else {
                after.render(sentinel)
            }
        })
        .collect();

    Ok(TableRun {
        table: table.clone().with_column(column, cells),
        report,
    })
}

/// Interpolates the normalization columns and appends min-max and z-score
/// versions of each.
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn run_normalize(table: &Table, config: &PipelineConfig) -> Result<TableRun> {
    require_columns(table, &config.normalize_columns)?;

    let mut report = RunReport::new("normalize", table.len());

    let mut filled = Vec::with_capacity(config.normalize_columns.len());
    for name in &config.normalize_columns {
        let (values, col_report) = fill_column(table, name)?;
        filled.push((name, values));
        report.numeric.push(col_report);
    }

    let mut out = table.clone();
    for (name, values) in &filled {
        out = out.with_column(name, format_column(values));
    }

    for method in ScaleMethod::ALL {
        for (name, values) in &filled {
            let scaled = match (method.apply(values), config.degenerate_scale) {
                (Ok(scaled), _) => scaled,
                (Err(_), ScalePolicy::Fail) => {
                    return Err(PipelineError::DegenerateScale {
                        column: name.to_string(),
                        method: method.label(),
                    });
                }
                (Err(_), ScalePolicy::Nan) => {
                    report.warn(format!(
                        "column '{name}' is constant; {} output left empty",
                        method.label()
                    ));
                    vec![f64::NAN; values.len()]
                }
            };
            out = out.with_column(&format!("{name}_{}", method.suffix()), format_column(&scaled));
        }
    }

    Ok(TableRun { table: out, report })
}
