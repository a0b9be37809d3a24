//! The benchmark matrix driver.

use std::{hint::black_box, time::Instant};

use chrono::Utc;
use log::{info, warn};
use overfetch_core::{RunIdentity, TableWidth};
use strum::IntoEnumIterator;

use crate::{
    report::{CellReport, LatencyStats, OperationResult, Outcome, Report},
    Config, Database, MeasurementConfig, Operation, OverfetchError, OverfetchResult,
    QueryStrategy, Seeder,
};

/// Drives the width × strategy × operation matrix, one cell at a time.
///
/// Setup failures (missing schema, unreachable database, run-row seeding) abort
/// [`Runner::run`]. Failures inside a cell are recorded in the report and the
/// remaining cells still run.
pub struct Runner {
    database: Database,
    seeder: Seeder,
    widths: Vec<TableWidth>,
    measurement: MeasurementConfig,
    strategies: Vec<Box<dyn QueryStrategy>>,
    run_identity: RunIdentity,
}

impl Runner {
    /// A runner for the strategies named in `config`.
    pub fn new(config: &Config, run_identity: RunIdentity) -> Self {
        let database = Database::new(&config.database);
        let strategies = config
            .strategies
            .iter()
            .map(|kind| kind.build(&database))
            .collect();
        Self::with_strategies(config, run_identity, strategies)
    }

    /// A runner over caller-supplied strategies, ignoring `config.strategies`.
    ///
    /// Only the first strategy of each [`StrategyKind`](crate::StrategyKind)
    /// is kept, so every (width, kind) pair maps to one cell of the report.
    pub fn with_strategies(
        config: &Config,
        run_identity: RunIdentity,
        strategies: Vec<Box<dyn QueryStrategy>>,
    ) -> Self {
        let mut kept: Vec<Box<dyn QueryStrategy>> = Vec::with_capacity(strategies.len());
        for strategy in strategies {
            if kept.iter().any(|k| k.kind() == strategy.kind()) {
                warn!("ignoring duplicate {} strategy", strategy.kind());
            } else {
                kept.push(strategy);
            }
        }
        Self {
            database: Database::new(&config.database),
            seeder: Seeder::new(config),
            widths: config.widths.clone(),
            measurement: config.measurement.clone(),
            strategies: kept,
            run_identity,
        }
    }

    /// Identity of the rows this runner seeds and reads.
    pub fn run_identity(&self) -> RunIdentity {
        self.run_identity
    }

    /// Verifies the schema, seeds this run's rows and measures every cell.
    pub fn run(&self) -> OverfetchResult<Report> {
        self.measurement.validate()?;
        if self.strategies.is_empty() || self.widths.is_empty() {
            return Err(OverfetchError::InvalidConfig(
                "the benchmark matrix is empty".to_string(),
            ));
        }
        self.database.verify_schema(&self.widths)?;
        self.seeder.seed_run_rows(self.run_identity)?;

        let started_at = Utc::now();
        let mut cells = Vec::with_capacity(self.widths.len() * self.strategies.len());
        for &width in &self.widths {
            for strategy in &self.strategies {
                cells.push(self.run_cell(strategy.as_ref(), width));
            }
        }
        let report = Report {
            run_identity: self.run_identity,
            database: self.database.path().display().to_string(),
            started_at,
            finished_at: Utc::now(),
            cells,
        };
        info!(
            "benchmark finished: {} cells, {} failed operations",
            report.cells.len(),
            report.failures().len()
        );
        Ok(report)
    }

    fn run_cell(&self, strategy: &dyn QueryStrategy, width: TableWidth) -> CellReport {
        info!("measuring {} on {}", strategy.kind(), width.table_name());
        let results = match self.setup_cell(strategy, width) {
            Ok(()) => Operation::iter()
                .map(|operation| {
                    let outcome = match self.measure(strategy, operation, width) {
                        Ok(stats) => Outcome::Measured(stats),
                        Err(err) => {
                            warn!(
                                "{} {operation} on {} failed: {err}",
                                strategy.kind(),
                                width.table_name()
                            );
                            Outcome::failed(&err)
                        }
                    };
                    OperationResult { operation, outcome }
                })
                .collect(),
            Err(err) => {
                warn!(
                    "setup of {} on {} failed: {err}",
                    strategy.kind(),
                    width.table_name()
                );
                Operation::iter()
                    .map(|operation| OperationResult {
                        operation,
                        outcome: Outcome::failed(&err),
                    })
                    .collect()
            }
        };
        CellReport {
            width,
            strategy: strategy.kind(),
            results,
        }
    }

    /// Resolves the run row through both operations and checks they agree.
    fn setup_cell(&self, strategy: &dyn QueryStrategy, width: TableWidth) -> OverfetchResult<()> {
        let full = strategy.fetch_full(width, self.run_identity)?;
        let projected = strategy.fetch_projected(width, self.run_identity)?;
        if full != projected {
            return Err(OverfetchError::EmailMismatch {
                table: width.table_name(),
                id: self.run_identity,
                full,
                projected,
            });
        }
        Ok(())
    }

    fn measure(
        &self,
        strategy: &dyn QueryStrategy,
        operation: Operation,
        width: TableWidth,
    ) -> OverfetchResult<LatencyStats> {
        let m = &self.measurement;
        for _ in 0..m.warmup_iterations {
            black_box(strategy.fetch(operation, width, self.run_identity)?);
        }
        let mut samples = Vec::with_capacity(m.max_samples);
        while samples.len() < m.max_samples {
            let start = Instant::now();
            for _ in 0..m.iterations_per_sample {
                black_box(strategy.fetch(operation, width, self.run_identity)?);
            }
            let elapsed = start.elapsed().as_secs_f64() * 1e9;
            samples.push(elapsed / f64::from(m.iterations_per_sample));
            if samples.len() >= m.min_samples
                && LatencyStats::relative_error(&samples) <= m.target_relative_error
            {
                break;
            }
        }
        Ok(LatencyStats::from_samples(&samples, m.iterations_per_sample))
    }
}
