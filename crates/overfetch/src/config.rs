//! Resolved settings for seeding and benchmarking.

use std::path::PathBuf;

use overfetch_core::TableWidth;
use strum::IntoEnumIterator;

use crate::{OverfetchError, OverfetchResult, StrategyKind};

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE: &str = "overfetch.sqlite";
/// Default directory receiving report artifacts.
pub const DEFAULT_ARTIFACTS: &str = "overfetch-results";
/// Number of random rows bulk-seeded into each table.
pub const DEFAULT_BULK_ROWS: usize = 1000;

/// Location of the backing SQLite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path of the database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE),
        }
    }
}

impl DatabaseConfig {
    /// A database at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Controls how long each (width, strategy, operation) combination is timed.
///
/// Each sample averages `iterations_per_sample` calls. Sampling stops once at
/// least `min_samples` have been taken and the relative error of the mean
/// drops to `target_relative_error`, or when `max_samples` is reached.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementConfig {
    /// Untimed calls before sampling starts.
    pub warmup_iterations: u32,
    /// Calls averaged into one sample.
    pub iterations_per_sample: u32,
    /// Samples taken before the stopping rule is consulted.
    pub min_samples: usize,
    /// Hard cap on samples.
    pub max_samples: usize,
    /// Error of the mean, as a fraction of the mean, considered stable.
    pub target_relative_error: f64,
}

impl MeasurementConfig {
    /// Default warm-up call count.
    pub const DEFAULT_WARMUP: u32 = 10;
    /// Default calls per sample.
    pub const DEFAULT_ITERATIONS: u32 = 20;
    /// Default minimum sample count.
    pub const DEFAULT_MIN_SAMPLES: usize = 10;
    /// Default maximum sample count.
    pub const DEFAULT_MAX_SAMPLES: usize = 100;
    /// Default stopping threshold.
    pub const DEFAULT_TARGET_ERROR: f64 = 0.02;

    /// Rejects settings that cannot produce statistics.
    pub fn validate(&self) -> OverfetchResult<()> {
        if self.iterations_per_sample == 0 {
            return Err(OverfetchError::InvalidConfig(
                "iterations per sample must be at least 1".to_string(),
            ));
        }
        if self.min_samples < 2 {
            return Err(OverfetchError::InvalidConfig(
                "at least 2 samples are required".to_string(),
            ));
        }
        if self.max_samples < self.min_samples {
            return Err(OverfetchError::InvalidConfig(format!(
                "max samples ({}) is below min samples ({})",
                self.max_samples, self.min_samples
            )));
        }
        if !self.target_relative_error.is_finite() || self.target_relative_error < 0.0 {
            return Err(OverfetchError::InvalidConfig(format!(
                "target relative error must be a non-negative number, got {}",
                self.target_relative_error
            )));
        }
        Ok(())
    }
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            warmup_iterations: Self::DEFAULT_WARMUP,
            iterations_per_sample: Self::DEFAULT_ITERATIONS,
            min_samples: Self::DEFAULT_MIN_SAMPLES,
            max_samples: Self::DEFAULT_MAX_SAMPLES,
            target_relative_error: Self::DEFAULT_TARGET_ERROR,
        }
    }
}

/// Everything a seeding or benchmark invocation needs, resolved up front and
/// handed to the [`Seeder`](crate::Seeder) and [`Runner`](crate::Runner).
#[derive(Debug, Clone)]
pub struct Config {
    /// Backing database.
    pub database: DatabaseConfig,
    /// Widths that are seeded and benchmarked.
    pub widths: Vec<TableWidth>,
    /// Strategies that are benchmarked.
    pub strategies: Vec<StrategyKind>,
    /// Random rows bulk-seeded per width.
    pub bulk_rows: usize,
    /// Timing parameters.
    pub measurement: MeasurementConfig,
    /// Directory receiving report files.
    pub artifacts_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            widths: TableWidth::all(),
            strategies: StrategyKind::iter().collect(),
            bulk_rows: DEFAULT_BULK_ROWS,
            measurement: MeasurementConfig::default(),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS),
        }
    }
}

impl Config {
    /// Replaces the database path.
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = DatabaseConfig::new(path);
        self
    }
    /// Replaces the width set, dropping duplicates and sorting ascending.
    pub fn with_widths(mut self, widths: impl IntoIterator<Item = TableWidth>) -> Self {
        let mut widths: Vec<TableWidth> = widths.into_iter().collect();
        widths.sort_unstable();
        widths.dedup();
        self.widths = widths;
        self
    }
    /// Replaces the strategy set, dropping duplicates and keeping first-seen order.
    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = StrategyKind>) -> Self {
        let mut kept = Vec::new();
        for strategy in strategies {
            if !kept.contains(&strategy) {
                kept.push(strategy);
            }
        }
        self.strategies = kept;
        self
    }
    /// Replaces the bulk row count.
    pub fn with_bulk_rows(mut self, bulk_rows: usize) -> Self {
        self.bulk_rows = bulk_rows;
        self
    }
    /// Replaces the timing parameters.
    pub fn with_measurement(mut self, measurement: MeasurementConfig) -> Self {
        self.measurement = measurement;
        self
    }
    /// Replaces the artifacts directory.
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Rejects configurations that cannot drive a benchmark.
    pub fn validate(&self) -> OverfetchResult<()> {
        if self.widths.is_empty() {
            return Err(OverfetchError::InvalidConfig(
                "no table widths selected".to_string(),
            ));
        }
        if self.strategies.is_empty() {
            return Err(OverfetchError::InvalidConfig(
                "no strategies selected".to_string(),
            ));
        }
        self.measurement.validate()
    }
}
