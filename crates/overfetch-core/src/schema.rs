//! The eight table widths and the DDL/DML generated from them.

use std::{fmt, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::SchemaError;

/// Name of the identity column shared by every wide table.
pub const ID_COLUMN: &str = "Id";
/// Name of the indexed, projected column shared by every wide table.
pub const EMAIL_COLUMN: &str = "Email";

/// The fixed set of table widths. A table of width `w` carries `w` filler
/// columns in addition to `Id` and `Email`.
#[derive(
    Copy, Clone, Debug, EnumIter, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "usize", try_from = "usize")]
pub enum TableWidth {
    /// 4 filler columns
    W4,
    /// 8 filler columns
    W8,
    /// 16 filler columns
    W16,
    /// 32 filler columns
    W32,
    /// 64 filler columns
    W64,
    /// 128 filler columns
    W128,
    /// 256 filler columns
    W256,
    /// 512 filler columns
    W512,
}

impl TableWidth {
    /// Number of filler columns in tables of this width.
    pub const fn filler_count(self) -> usize {
        match self {
            Self::W4 => 4,
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
            Self::W128 => 128,
            Self::W256 => 256,
            Self::W512 => 512,
        }
    }

    /// Total number of columns (identity, email and fillers).
    pub const fn column_count(self) -> usize {
        self.filler_count() + 2
    }

    /// All eight widths in ascending order.
    pub fn all() -> Vec<TableWidth> {
        Self::iter().collect()
    }

    /// Name of the table backing this width, e.g. `Table64`.
    pub fn table_name(self) -> String {
        format!("Table{}", self.filler_count())
    }

    /// Name of the email index on this width's table.
    pub fn email_index_name(self) -> String {
        format!("IX_{}_{}", self.table_name(), EMAIL_COLUMN)
    }

    /// Filler column names, `Field1` through `Field{width}`.
    pub fn filler_columns(self) -> impl Iterator<Item = String> {
        (1..=self.filler_count()).map(|i| format!("Field{i}"))
    }

    /// Every column name in declaration order.
    pub fn columns(self) -> Vec<String> {
        [ID_COLUMN.to_string(), EMAIL_COLUMN.to_string()]
            .into_iter()
            .chain(self.filler_columns())
            .collect()
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this width.
    pub fn create_table_sql(self) -> String {
        let fillers = self
            .filler_columns()
            .map(|c| format!("{c} TEXT NOT NULL"))
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({ID_COLUMN} TEXT NOT NULL PRIMARY KEY, {EMAIL_COLUMN} TEXT NOT NULL, {fillers})",
            self.table_name()
        )
    }

    /// `CREATE INDEX IF NOT EXISTS` statement for the email column.
    pub fn create_index_sql(self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({EMAIL_COLUMN})",
            self.email_index_name(),
            self.table_name()
        )
    }

    /// Parameterized insert covering every column, bound positionally.
    pub fn insert_sql(self) -> String {
        let columns = self.columns();
        let placeholders = (1..=columns.len()).map(|i| format!("?{i}")).join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.table_name(),
            columns.join(", ")
        )
    }
}

impl From<TableWidth> for usize {
    fn from(value: TableWidth) -> Self {
        value.filler_count()
    }
}

impl TryFrom<usize> for TableWidth {
    type Error = SchemaError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        TableWidth::iter()
            .find(|w| w.filler_count() == value)
            .ok_or(SchemaError::UnsupportedWidth(value))
    }
}

impl FromStr for TableWidth {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: usize = s
            .trim()
            .parse()
            .map_err(|_| SchemaError::InvalidWidth(s.to_string()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for TableWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filler_count())
    }
}
