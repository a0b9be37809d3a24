//! Command-line entry point.

use std::{env, ffi::OsString, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::{error, info};
use overfetch_core::{RunIdentity, TableWidth};

use crate::{
    config::{DEFAULT_ARTIFACTS, DEFAULT_BULK_ROWS, DEFAULT_DATABASE},
    Config, MeasurementConfig, OverfetchResult, Runner, Seeder, StrategyKind,
};

#[derive(Parser)]
#[command(name = "overfetch", version, about)]
struct Cli {
    /// `seed` creates and populates the tables; anything else (or nothing)
    /// runs the benchmarks
    action: Option<String>,

    /// SQLite database path (or env OVERFETCH_DATABASE)
    #[arg(long, env = "OVERFETCH_DATABASE", default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    /// Comma-separated table widths (default: all of 4,8,16,32,64,128,256,512)
    #[arg(
        long,
        env = "OVERFETCH_WIDTHS",
        value_delimiter = ',',
        value_parser = parse_width
    )]
    widths: Vec<TableWidth>,

    /// Comma-separated strategies (default: orm,orm-no-tracking,sql)
    #[arg(
        long,
        env = "OVERFETCH_STRATEGIES",
        value_delimiter = ',',
        value_parser = parse_strategy
    )]
    strategies: Vec<StrategyKind>,

    /// Random rows bulk-seeded per width (or env OVERFETCH_BULK_ROWS)
    #[arg(long, env = "OVERFETCH_BULK_ROWS", default_value_t = DEFAULT_BULK_ROWS)]
    bulk_rows: usize,

    /// Untimed calls before sampling each operation
    #[arg(long, env = "OVERFETCH_WARMUP", default_value_t = MeasurementConfig::DEFAULT_WARMUP)]
    warmup: u32,

    /// Calls averaged into one sample
    #[arg(
        long,
        env = "OVERFETCH_ITERATIONS",
        default_value_t = MeasurementConfig::DEFAULT_ITERATIONS
    )]
    iterations: u32,

    /// Samples taken before checking for a stable mean
    #[arg(
        long,
        env = "OVERFETCH_MIN_SAMPLES",
        default_value_t = MeasurementConfig::DEFAULT_MIN_SAMPLES
    )]
    min_samples: usize,

    /// Maximum samples per operation
    #[arg(
        long,
        env = "OVERFETCH_MAX_SAMPLES",
        default_value_t = MeasurementConfig::DEFAULT_MAX_SAMPLES
    )]
    max_samples: usize,

    /// Relative error of the mean at which sampling stops
    #[arg(
        long,
        env = "OVERFETCH_TARGET_ERROR",
        default_value_t = MeasurementConfig::DEFAULT_TARGET_ERROR
    )]
    target_error: f64,

    /// Directory for report.md and report.json (or env OVERFETCH_ARTIFACTS)
    #[arg(long, env = "OVERFETCH_ARTIFACTS", default_value = DEFAULT_ARTIFACTS)]
    artifacts: PathBuf,
}

fn parse_width(s: &str) -> Result<TableWidth, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_strategy(s: &str) -> Result<StrategyKind, String> {
    s.parse().map_err(|e| format!("{e}"))
}

impl Cli {
    fn is_seed(&self) -> bool {
        self.action
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case("seed"))
    }

    fn into_config(self) -> Config {
        let mut config = Config::default()
            .with_database(self.database)
            .with_bulk_rows(self.bulk_rows)
            .with_artifacts_dir(self.artifacts)
            .with_measurement(MeasurementConfig {
                warmup_iterations: self.warmup,
                iterations_per_sample: self.iterations,
                min_samples: self.min_samples,
                max_samples: self.max_samples,
                target_relative_error: self.target_error,
            });
        if !self.widths.is_empty() {
            config = config.with_widths(self.widths);
        }
        if !self.strategies.is_empty() {
            config = config.with_strategies(self.strategies);
        }
        config
    }
}

fn seed(config: &Config, run_identity: RunIdentity) -> OverfetchResult<ExitCode> {
    info!(
        "seeding {} ({} bulk rows per width)",
        config.database.path.display(),
        config.bulk_rows
    );
    Seeder::new(config).seed(run_identity)?;
    Ok(ExitCode::SUCCESS)
}

fn benchmark(config: &Config, run_identity: RunIdentity) -> OverfetchResult<ExitCode> {
    config.validate()?;
    info!("benchmark run {run_identity}");
    let report = Runner::new(config, run_identity).run()?;
    println!("{}", report.to_markdown());
    for path in report.write_artifacts(&config.artifacts_dir)? {
        info!("wrote {}", path.display());
    }
    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("{} operations failed", report.failures().len());
        Ok(ExitCode::FAILURE)
    }
}

/// Execute the command-line interface with a custom argv iterator.
///
/// Setup errors are returned; failed benchmark cells only turn the exit code
/// into a failure.
pub fn run_with_args<I, T>(args: I) -> OverfetchResult<ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let is_seed = cli.is_seed();
    let config = cli.into_config();
    let run_identity = RunIdentity::generate();
    if is_seed {
        seed(&config, run_identity)
    } else {
        benchmark(&config, run_identity)
    }
}

/// Execute the command-line interface with the process arguments.
pub fn cli() -> OverfetchResult<ExitCode> {
    run_with_args(env::args_os())
}
