//! Micro-benchmark harness comparing full-row fetches against single-column
//! projections across table widths and data-access strategies.

pub mod cli;
pub mod config;
pub mod database;
pub mod mapped;
pub mod report;
pub mod runner;
pub mod seed;
pub mod sql;
pub mod strategy;

pub use config::{Config, DatabaseConfig, MeasurementConfig};
pub use database::Database;
pub use report::{LatencyStats, Outcome, Report};
pub use runner::Runner;
pub use seed::Seeder;
pub use strategy::{Operation, QueryStrategy, StrategyKind};

use overfetch_core::{RecordId, SchemaError};
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Convenience alias for results returned from harness operations.
pub type OverfetchResult<T> = Result<T, OverfetchError>;

/// Broad classification of [`OverfetchError`] values.
///
/// Whether an error is fatal depends on where it is raised, not on its kind:
/// anything raised before the matrix starts aborts the run, and anything
/// raised inside a cell (a storage error included) fails only that cell and
/// is reported with its kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// Storage or filesystem failure, such as a missing schema or a failed
    /// statement.
    Setup,
    /// A fetch did not observe exactly one matching row, or strategies
    /// disagreed about its contents.
    InvariantViolation,
    /// A width, strategy or setting outside the supported set was requested,
    /// or a row did not have the column count of its width.
    UnsupportedParameter,
}

/// Errors that can occur while seeding, querying or reporting.
#[derive(Error, Debug)]
pub enum OverfetchError {
    /// Wrapper around rusqlite errors.
    #[error("{0}")]
    SqliteError(#[from] rusqlite::Error),
    /// Wrapper around schema and record errors.
    #[error("{0}")]
    SchemaError(#[from] SchemaError),
    /// A wide table is absent from the database.
    #[error("table {0} does not exist (run `overfetch seed` first)")]
    MissingTable(String),
    /// A lookup by identity matched zero or several rows.
    #[error("expected exactly one row in {table} with Id {id}, found {found}")]
    NotExactlyOneRow {
        /// Table that was queried.
        table: String,
        /// Identity that was looked up.
        id: RecordId,
        /// Number of rows observed (capped at two).
        found: usize,
    },
    /// The full and projected fetches of the same row returned different emails.
    #[error("{table} row {id}: full fetch returned {full:?}, projected fetch returned {projected:?}")]
    EmailMismatch {
        /// Table that was queried.
        table: String,
        /// Identity that was looked up.
        id: RecordId,
        /// Email from the full-row fetch.
        full: String,
        /// Email from the projected fetch.
        projected: String,
    },
    /// A mapped entity was asked for a column it does not have.
    #[error("table {table} has no column {column}")]
    UnknownColumn {
        /// Table that was queried.
        table: String,
        /// Requested column.
        column: String,
    },
    /// A strategy name outside the supported set.
    #[error("unsupported strategy: {0} (expected one of orm, orm-no-tracking, sql)")]
    UnsupportedStrategy(String),
    /// Configuration values that cannot drive a benchmark.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Failure writing report artifacts.
    #[error("{0}")]
    IoError(#[from] std::io::Error),
    /// Failure serializing the JSON report.
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),
}

impl OverfetchError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SqliteError(_)
            | Self::MissingTable(_)
            | Self::IoError(_)
            | Self::JsonError(_) => ErrorKind::Setup,
            Self::SchemaError(err) => match err {
                SchemaError::UnsupportedWidth(_) | SchemaError::InvalidWidth(_) => {
                    ErrorKind::UnsupportedParameter
                }
                SchemaError::FillerCountMismatch { .. } => ErrorKind::UnsupportedParameter,
                SchemaError::SqliteError(_) => ErrorKind::Setup,
                SchemaError::EmptyEmail { .. } | SchemaError::InvalidIdentity(_) => {
                    ErrorKind::InvariantViolation
                }
            },
            Self::NotExactlyOneRow { .. } | Self::EmailMismatch { .. } => {
                ErrorKind::InvariantViolation
            }
            Self::UnknownColumn { .. } | Self::UnsupportedStrategy(_) | Self::InvalidConfig(_) => {
                ErrorKind::UnsupportedParameter
            }
        }
    }
}

/// Re-exports for the most common types.
pub mod prelude {
    pub use crate::{
        config::{Config, DatabaseConfig, MeasurementConfig},
        database::Database,
        report::{CellReport, LatencyStats, OperationResult, Outcome, Report},
        runner::Runner,
        seed::Seeder,
        strategy::{Operation, QueryStrategy, StrategyKind},
        ErrorKind, OverfetchError, OverfetchResult,
    };
    pub use overfetch_core::prelude::*;
}
