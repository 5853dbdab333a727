//! Output formatting and persistence for run products.
//!
//! Supports CSV tables (optionally gzip-compressed), the level tally, the
//! per-date AQI table, and the JSON run report.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::{ClassifiedDay, LevelCount};
use crate::parser::Table;
use crate::stats::RunReport;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Renders a rewritten numeric cell. Integral values keep a trailing `.0`,
/// NaN becomes an empty cell.
pub fn format_numeric(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

pub fn format_column(values: &[f64]) -> Vec<String> {
    values.iter().map(|&v| format_numeric(v)).collect()
}

/// Writes `contents` to `path`, gzip-compressing and appending `.gz` when asked.
/// Returns the path actually written.
fn persist(path: &Path, contents: Vec<u8>, gzip: bool) -> Result<PathBuf> {
    let (body, target) = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&contents)?;
        let compressed = encoder.finish()?;

        let target = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            path.to_path_buf()
        } else {
            let mut name = path.as_os_str().to_owned();
            name.push(".gz");
            PathBuf::from(name)
        };
        (compressed, target)
    } else {
        (contents, path.to_path_buf())
    };

    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&target, body)?;
    debug!(path = %target.display(), gzip, "Wrote output");
    Ok(target)
}

fn serialize_rows<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    Ok(writer.into_inner()?)
}

/// Writes a full table, header first.
pub fn write_table(path: &Path, table: &Table, gzip: bool) -> Result<PathBuf> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    persist(path, writer.into_inner()?, gzip)
}

/// Writes the level tally as UTF-8 with a byte-order mark so spreadsheet
/// tools pick up non-ASCII labels.
pub fn write_tally(path: &Path, tally: &[LevelCount], gzip: bool) -> Result<PathBuf> {
    let mut contents = UTF8_BOM.to_vec();
    if tally.is_empty() {
        contents.extend_from_slice(b"AQI_Level,Number_of_Days,color\n");
    } else {
        contents.extend(serialize_rows(tally)?);
    }
    persist(path, contents, gzip)
}

/// Writes one row per date: the pollutant means, the AQI and its level.
pub fn write_daily(
    path: &Path,
    columns: &[String],
    days: &[ClassifiedDay],
    gzip: bool,
) -> Result<PathBuf> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header = vec!["date".to_string()];
    header.extend(columns.iter().cloned());
    header.extend(["AQI", "AQI_Level", "AQI_Color"].map(String::from));
    writer.write_record(&header)?;

    for day in days {
        let mut record = vec![day.date.format("%Y-%m-%d").to_string()];
        record.extend(day.means.iter().map(|&m| format_numeric(m)));
        record.push(format_numeric(day.aqi));
        record.push(day.level.clone());
        record.push(day.color.clone());
        writer.write_record(&record)?;
    }

    let mut contents = UTF8_BOM.to_vec();
    contents.extend(writer.into_inner()?);
    persist(path, contents, gzip)
}

/// Writes the run report as pretty-printed JSON.
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let body = serde_json::to_vec_pretty(report)?;
    persist(path, body, false)?;
    Ok(())
}

/// Logs a run report as one summary line plus one line per column.
pub fn print_report(report: &RunReport) {
    info!(
        run = %report.run,
        rows = report.rows,
        days = report.days,
        clipped = report.total_clipped(),
        unresolved = report.total_unresolved(),
        skipped = report.skipped_columns.len(),
        warnings = report.warnings.len(),
        "Run summary"
    );

    for col in &report.numeric {
        info!(
            column = %col.column,
            missing = col.missing,
            unparseable = col.unparseable,
            interpolated = col.interpolated,
            clipped_upper = col.clipped_upper,
            clipped_lower = col.clipped_lower,
            "Numeric column"
        );
    }

    for col in &report.categorical {
        info!(
            column = %col.column,
            sentinels = col.sentinels,
            repaired = col.repaired,
            blanks_filled = col.blanks_filled,
            unresolved = col.unresolved,
            "Categorical column"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(1021.0), "1021.0");
        assert_eq!(format_numeric(-4.0), "-4.0");
        assert_eq!(format_numeric(2.25), "2.25");
        assert_eq!(format_numeric(f64::NAN), "");
    }

    #[test]
    fn test_write_table_round_trips() {
        let path = temp_path("aqi_pipeline_test_table.csv");
        let _ = fs::remove_file(&path);

        let table = parse_table("a,b\n1,x\n2,\"y,z\"\n".as_bytes()).unwrap();
        let written = write_table(&path, &table, false).unwrap();
        assert_eq!(written, path);

        let reread = parse_table(fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(reread, table);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_table_gzip_appends_extension() {
        let path = temp_path("aqi_pipeline_test_table_gz.csv");
        let table = parse_table("a\n1\n".as_bytes()).unwrap();

        let written = write_table(&path, &table, true).unwrap();
        assert_eq!(written, temp_path("aqi_pipeline_test_table_gz.csv.gz"));

        let reread = crate::parser::load_table(&written).unwrap();
        assert_eq!(reread, table);

        fs::remove_file(&written).unwrap();
    }

    #[test]
    fn test_write_tally_has_bom_and_header() {
        let path = temp_path("aqi_pipeline_test_tally.csv");
        let tally = vec![LevelCount {
            level: "Good".into(),
            days: 12,
            color: "yellow".into(),
        }];
        write_tally(&path, &tally, false).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "AQI_Level,Number_of_Days,color\nGood,12,yellow\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_report_is_json() {
        let path = temp_path("aqi_pipeline_test_report.json");
        let report = RunReport::new("normalize", 3);
        write_report(&path, &report).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["run"], "normalize");
        assert_eq!(value["rows"], 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_print_report_does_not_panic() {
        print_report(&RunReport::new("tally", 0));
    }
}
