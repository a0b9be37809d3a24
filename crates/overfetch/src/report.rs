//! Latency statistics and the benchmark report with its markdown and JSON
//! exporters.

use std::{
    fmt,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use overfetch_core::{RunIdentity, TableWidth};
use serde::{Deserialize, Serialize};

use crate::{ErrorKind, Operation, OverfetchError, OverfetchResult, StrategyKind};

/// Two-sided 99.9% quantile of the standard normal distribution.
const Z_99_9: f64 = 3.290_526_731_491_926;

/// Latency distribution of one benchmarked operation, in nanoseconds per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Mean of the samples.
    pub mean_ns: f64,
    /// Half-width of the 99.9% confidence interval of the mean.
    pub error_ns: f64,
    /// Sample standard deviation.
    pub std_dev_ns: f64,
    /// Median sample.
    pub median_ns: f64,
    /// Fastest sample.
    pub min_ns: f64,
    /// Slowest sample.
    pub max_ns: f64,
    /// Number of samples.
    pub samples: usize,
    /// Calls averaged into each sample.
    pub iterations_per_sample: u32,
}

impl LatencyStats {
    /// Summarizes per-call sample means. An empty slice yields all zeros.
    pub fn from_samples(samples: &[f64], iterations_per_sample: u32) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self {
                mean_ns: 0.0,
                error_ns: 0.0,
                std_dev_ns: 0.0,
                median_ns: 0.0,
                min_ns: 0.0,
                max_ns: 0.0,
                samples: 0,
                iterations_per_sample,
            };
        }
        let mean = mean(samples);
        let std_dev = std_dev(samples, mean);
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        Self {
            mean_ns: mean,
            error_ns: confidence_half_width(std_dev, n),
            std_dev_ns: std_dev,
            median_ns: median,
            min_ns: sorted[0],
            max_ns: sorted[n - 1],
            samples: n,
            iterations_per_sample,
        }
    }

    /// `error / mean` for a set of samples: zero if the mean is zero, infinite
    /// if there are no samples.
    pub fn relative_error(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return f64::INFINITY;
        }
        let mean = mean(samples);
        if mean == 0.0 {
            return 0.0;
        }
        confidence_half_width(std_dev(samples, mean), samples.len()) / mean
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn std_dev(samples: &[f64], mean: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|s| (s - mean).powi(2)).sum();
    (sum_sq / (samples.len() - 1) as f64).sqrt()
}

#[allow(clippy::cast_precision_loss)]
fn confidence_half_width(std_dev: f64, n: usize) -> f64 {
    Z_99_9 * std_dev / (n as f64).sqrt()
}

/// Result of benchmarking one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    /// The operation was timed.
    Measured(LatencyStats),
    /// The operation raised an error; no timings were kept.
    Failed {
        /// Classification of the error.
        kind: ErrorKind,
        /// Rendered error message.
        message: String,
    },
}

impl Outcome {
    /// A failed outcome describing `error`.
    pub fn failed(error: &OverfetchError) -> Self {
        Self::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// Timings, if the operation succeeded.
    pub fn stats(&self) -> Option<&LatencyStats> {
        match self {
            Self::Measured(stats) => Some(stats),
            Self::Failed { .. } => None,
        }
    }

    /// Whether the operation succeeded.
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured(_))
    }
}

/// One operation's result within a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    /// The timed operation.
    pub operation: Operation,
    /// What happened.
    pub outcome: Outcome,
}

/// Results for one (width, strategy) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellReport {
    /// Table width.
    pub width: TableWidth,
    /// Strategy under test.
    pub strategy: StrategyKind,
    /// One entry per operation.
    pub results: Vec<OperationResult>,
}

impl CellReport {
    /// The outcome recorded for `operation`.
    pub fn outcome(&self, operation: Operation) -> Option<&Outcome> {
        self.results
            .iter()
            .find(|r| r.operation == operation)
            .map(|r| &r.outcome)
    }

    /// Whether every operation in the cell was measured.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_measured())
    }

    /// Mean full-fetch latency divided by mean projected-fetch latency.
    pub fn overfetch_ratio(&self) -> Option<f64> {
        let full = self.outcome(Operation::FetchFull)?.stats()?.mean_ns;
        let projected = self.outcome(Operation::FetchProjected)?.stats()?.mean_ns;
        (projected > 0.0).then(|| full / projected)
    }
}

/// Results of a complete benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Identity tagging this run's rows.
    pub run_identity: RunIdentity,
    /// Database file that was benchmarked.
    pub database: String,
    /// When measurement began.
    pub started_at: DateTime<Utc>,
    /// When measurement finished.
    pub finished_at: DateTime<Utc>,
    /// One entry per (width, strategy) pair, in execution order.
    pub cells: Vec<CellReport>,
}

impl Report {
    /// The cell for `(width, strategy)`.
    pub fn cell(&self, width: TableWidth, strategy: StrategyKind) -> Option<&CellReport> {
        self.cells
            .iter()
            .find(|c| c.width == width && c.strategy == strategy)
    }

    /// The outcome for `(width, strategy, operation)`.
    pub fn outcome(
        &self,
        width: TableWidth,
        strategy: StrategyKind,
        operation: Operation,
    ) -> Option<&Outcome> {
        self.cell(width, strategy)?.outcome(operation)
    }

    /// Whether every operation of every cell was measured.
    pub fn is_success(&self) -> bool {
        self.cells.iter().all(CellReport::is_success)
    }

    /// Every failed `(width, strategy, operation)` with its outcome.
    pub fn failures(&self) -> Vec<(TableWidth, StrategyKind, Operation, &Outcome)> {
        self.cells
            .iter()
            .flat_map(|cell| {
                cell.results
                    .iter()
                    .filter(|r| !r.outcome.is_measured())
                    .map(move |r| (cell.width, cell.strategy, r.operation, &r.outcome))
            })
            .collect()
    }

    /// Renders a GitHub-flavoured markdown summary.
    pub fn to_markdown(&self) -> String {
        self.to_string()
    }

    /// Writes `report.md` and `report.json` into `dir`, creating it if needed.
    pub fn write_artifacts(&self, dir: impl AsRef<Path>) -> OverfetchResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let markdown_path = dir.join("report.md");
        fs::write(&markdown_path, self.to_markdown())?;
        let json_path = dir.join("report.json");
        let writer = BufWriter::new(File::create(&json_path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(vec![markdown_path, json_path])
    }
}

/// Formats nanoseconds with a unit that keeps the value readable.
pub fn format_duration(ns: f64) -> String {
    if ns < 1_000.0 {
        format!("{ns:.1} ns")
    } else if ns < 1_000_000.0 {
        format!("{:.3} us", ns / 1_000.0)
    } else {
        format!("{:.3} ms", ns / 1_000_000.0)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Over-fetching benchmark\n")?;
        writeln!(f, "- run: `{}`", self.run_identity)?;
        writeln!(f, "- database: `{}`", self.database)?;
        writeln!(
            f,
            "- started: {}\n- finished: {}\n",
            self.started_at.to_rfc3339(),
            self.finished_at.to_rfc3339()
        )?;
        writeln!(
            f,
            "| Strategy | Width | Operation | Mean | Error | StdDev | Median | Ratio | Samples |"
        )?;
        writeln!(
            f,
            "|--------- |------:|---------- |-----:|------:|-------:|-------:|------:|--------:|"
        )?;
        for cell in &self.cells {
            let projected_mean = cell
                .outcome(Operation::FetchProjected)
                .and_then(Outcome::stats)
                .map(|s| s.mean_ns);
            for result in &cell.results {
                match &result.outcome {
                    Outcome::Measured(stats) => {
                        let ratio = projected_mean.filter(|m| *m > 0.0).map_or_else(
                            || "NA".to_string(),
                            |m| format!("{:.2}", stats.mean_ns / m),
                        );
                        writeln!(
                            f,
                            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                            cell.strategy,
                            cell.width,
                            result.operation,
                            format_duration(stats.mean_ns),
                            format_duration(stats.error_ns),
                            format_duration(stats.std_dev_ns),
                            format_duration(stats.median_ns),
                            ratio,
                            stats.samples
                        )?;
                    }
                    Outcome::Failed { .. } => {
                        writeln!(
                            f,
                            "| {} | {} | {} | NA | NA | NA | NA | NA | 0 |",
                            cell.strategy, cell.width, result.operation
                        )?;
                    }
                }
            }
        }
        let failures = self.failures();
        if !failures.is_empty() {
            writeln!(f, "\n## Failures\n")?;
            for (width, strategy, operation, outcome) in failures {
                if let Outcome::Failed { kind, message } = outcome {
                    writeln!(f, "- {strategy} / {width} / {operation}: {kind}: {message}")?;
                }
            }
        }
        Ok(())
    }
}
