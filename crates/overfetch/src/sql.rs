//! Hand-written SQL strategy.

use overfetch_core::{RecordId, TableWidth, WideRecord};

use crate::{database::query_single, Database, OverfetchResult, QueryStrategy, StrategyKind};

/// Micro-mapper strategy: hand-written SQL, results mapped straight into
/// values with no metadata model or session state.
#[derive(Debug, Clone)]
pub struct SqlStrategy {
    database: Database,
}

impl SqlStrategy {
    /// A strategy over `database`.
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

impl QueryStrategy for SqlStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sql
    }

    fn fetch_full(&self, width: TableWidth, id: RecordId) -> OverfetchResult<String> {
        let conn = self.database.open_read_only()?;
        let sql = format!("SELECT * FROM {} WHERE Id = ?1", width.table_name());
        let record = query_single(&conn, &sql, width, id, |row| {
            Ok(WideRecord::from_row(width, row)?)
        })?;
        Ok(record.into_email())
    }

    fn fetch_projected(&self, width: TableWidth, id: RecordId) -> OverfetchResult<String> {
        let conn = self.database.open_read_only()?;
        let sql = format!("SELECT Email FROM {} WHERE Id = ?1", width.table_name());
        query_single(&conn, &sql, width, id, |row| Ok(row.get(0)?))
    }
}
