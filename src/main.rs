//! CLI entry point for the air-quality conditioning pipeline.
//!
//! Each subcommand is an independent run: it reads the hourly table, applies
//! one conditioning path, and writes its product plus optional diagnostics.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aqi_pipeline::config::PipelineConfig;
use aqi_pipeline::output::{print_report, write_daily, write_report, write_table, write_tally};
use aqi_pipeline::parser::load_table;
use aqi_pipeline::pipeline::{
    TableRun, run_aqi_tally, run_fixed_cap, run_normalize, run_statistical_clip, run_wind_repair,
};
use aqi_pipeline::stats::RunReport;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_INPUT: &str = "BeijingPM20100101_20151231.csv";

#[derive(Parser)]
#[command(name = "aqi_pipeline")]
#[command(about = "Clean, aggregate and classify hourly air-quality data", long_about = None)]
struct Cli {
    /// JSON pipeline config (defaults to $AQI_PIPELINE_CONFIG, then built-in values)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the run diagnostics as JSON to this path
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Gzip-compress the CSV outputs
    #[arg(long, global = true, default_value_t = false)]
    gzip: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify each day's AQI and count days per level
    Tally {
        /// Hourly input CSV (may be .gz)
        #[arg(value_name = "INPUT", default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Level tally CSV
        #[arg(short, long, default_value = "AQI_levels_counts.csv")]
        output: PathBuf,

        /// Optional per-date CSV with means, AQI and level
        #[arg(long)]
        daily: Option<PathBuf>,
    },
    /// Clip HUMI/PRES/TEMP at mean ± 3 standard deviations
    ClipSd {
        #[arg(value_name = "INPUT", default_value = DEFAULT_INPUT)]
        input: PathBuf,

        #[arg(short, long, default_value = "BeijingPM20100101_20151231_processed_3SD.csv")]
        output: PathBuf,
    },
    /// Cap PM concentrations at a fixed maximum
    CapPm {
        #[arg(value_name = "INPUT", default_value = DEFAULT_INPUT)]
        input: PathBuf,

        #[arg(short, long, default_value = "BeijingPM20100101_20151231_processed_500PMmax.csv")]
        output: PathBuf,
    },
    /// Back-fill calm/variable wind readings
    RepairWind {
        #[arg(value_name = "INPUT", default_value = DEFAULT_INPUT)]
        input: PathBuf,

        #[arg(short, long, default_value = "BeijingPM20100101_20151231_processed_cv.csv")]
        output: PathBuf,
    },
    /// Append min-max and z-score columns for DEWP/TEMP
    Normalize {
        #[arg(value_name = "INPUT", default_value = DEFAULT_INPUT)]
        input: PathBuf,

        #[arg(
            short,
            long,
            default_value = "BeijingPM20100101_20151231_DEWP_TEMP_Normalized.csv"
        )]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let report = match cli.command {
        Commands::Tally {
            input,
            output,
            daily,
        } => {
            let table = load_table(&input)?;
            let run = run_aqi_tally(&table, &config)?;

            let written = write_tally(&output, &run.tally, cli.gzip)?;
            info!(path = %written.display(), "AQI level counts saved");

            for row in &run.tally {
                info!(level = %row.level, days = row.days, color = %row.color, "Level");
            }

            if let Some(daily) = daily {
                let written = write_daily(&daily, &config.aqi_columns, &run.days, cli.gzip)?;
                info!(path = %written.display(), "Daily AQI table saved");
            }

            run.report.with_input(&input.to_string_lossy())
        }
        Commands::ClipSd { input, output } => {
            table_run(&input, &output, cli.gzip, |t| run_statistical_clip(t, &config))?
        }
        Commands::CapPm { input, output } => {
            table_run(&input, &output, cli.gzip, |t| run_fixed_cap(t, &config))?
        }
        Commands::RepairWind { input, output } => {
            table_run(&input, &output, cli.gzip, |t| run_wind_repair(t, &config))?
        }
        Commands::Normalize { input, output } => {
            table_run(&input, &output, cli.gzip, |t| run_normalize(t, &config))?
        }
    };

    print_report(&report);

    if let Some(path) = &cli.report {
        write_report(path, &report)?;
        info!(path = %path.display(), "Run report saved");
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/aqi_pipeline.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("aqi_pipeline.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Resolves the config from `--config`, then `AQI_PIPELINE_CONFIG`, then defaults.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("AQI_PIPELINE_CONFIG").map(PathBuf::from));

    match path {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load config '{}'", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

/// Loads `input`, applies a table-rewriting run and saves the result.
fn table_run<F>(input: &Path, output: &Path, gzip: bool, run: F) -> Result<RunReport>
where
    F: FnOnce(&aqi_pipeline::parser::Table) -> aqi_pipeline::error::Result<TableRun>,
{
    let table = load_table(input)?;
    info!(path = %input.display(), rows = table.len(), "Loaded input");

    let TableRun { table, report } = run(&table)?;

    let written = write_table(output, &table, gzip)?;
    info!(path = %written.display(), "Processed data saved");

    Ok(report.with_input(&input.to_string_lossy()))
}
