//! The query strategy interface and the strategy/operation enumerations.

use std::str::FromStr;

use overfetch_core::{RecordId, TableWidth};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::{
    mapped::{MappedStrategy, QueryTracking},
    sql::SqlStrategy,
    Database, OverfetchError, OverfetchResult,
};

/// The two timed query shapes.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Operation {
    /// Retrieve every column of the row, then read `Email`.
    FetchFull,
    /// Retrieve only the `Email` column.
    FetchProjected,
}

/// Available data-access strategies.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StrategyKind {
    /// Entity mapping with change tracking and an identity map.
    Orm,
    /// Entity mapping without change tracking.
    OrmNoTracking,
    /// Hand-written SQL mapped directly into values.
    Sql,
}

impl StrategyKind {
    /// Instantiates the strategy against `database`.
    pub fn build(self, database: &Database) -> Box<dyn QueryStrategy> {
        match self {
            Self::Orm => Box::new(MappedStrategy::new(database.clone(), QueryTracking::TrackAll)),
            Self::OrmNoTracking => Box::new(MappedStrategy::new(
                database.clone(),
                QueryTracking::NoTracking,
            )),
            Self::Sql => Box::new(SqlStrategy::new(database.clone())),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = OverfetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(name))
            .ok_or_else(|| OverfetchError::UnsupportedStrategy(s.to_string()))
    }
}

/// A way of reading the email of one row, either by fetching the whole row or
/// by projecting the single column.
///
/// Both operations must return the same email for the same `(width, id)`, and
/// both fail with [`OverfetchError::NotExactlyOneRow`] unless exactly one row
/// matches. Implementations open and release their own connection per call
/// and never retry.
pub trait QueryStrategy {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Fetches every column of the row and returns its email.
    fn fetch_full(&self, width: TableWidth, id: RecordId) -> OverfetchResult<String>;

    /// Fetches only the email column of the row.
    fn fetch_projected(&self, width: TableWidth, id: RecordId) -> OverfetchResult<String>;

    /// Dispatches to the requested operation.
    fn fetch(
        &self,
        operation: Operation,
        width: TableWidth,
        id: RecordId,
    ) -> OverfetchResult<String> {
        match operation {
            Operation::FetchFull => self.fetch_full(width, id),
            Operation::FetchProjected => self.fetch_projected(width, id),
        }
    }
}
