//! Connection handling and schema management for the SQLite store.

use std::path::{Path, PathBuf};

use log::debug;
use overfetch_core::{RecordId, TableWidth};
use rusqlite::{params, Connection, OpenFlags, Row};

use crate::{DatabaseConfig, OverfetchError, OverfetchResult};

/// Handle on the SQLite file backing the wide tables.
///
/// Connections are not pooled: every caller opens one, uses it for a single
/// unit of work and drops it.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// A handle on the configured database file.
    pub fn new(config: &DatabaseConfig) -> Self {
        Self::at(&config.path)
    }

    /// A handle on the given database file.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the filesystem path of the database.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a read-only connection; fails if the file does not exist.
    pub fn open_read_only(&self) -> OverfetchResult<Connection> {
        Ok(Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?)
    }

    /// Opens a read-write connection, creating the file if needed.
    pub fn open_read_write(&self) -> OverfetchResult<Connection> {
        Ok(Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?)
    }

    /// Creates every wide table and its email index if they are missing.
    pub fn ensure_schema(&self) -> OverfetchResult<()> {
        let mut conn = self.open_read_write()?;
        let tx = conn.transaction()?;
        for width in TableWidth::all() {
            tx.execute(&width.create_table_sql(), [])?;
            tx.execute(&width.create_index_sql(), [])?;
            debug!("ensured {}", width.table_name());
        }
        tx.commit()?;
        Ok(())
    }

    /// Checks that the tables for `widths` exist.
    pub fn verify_schema(&self, widths: &[TableWidth]) -> OverfetchResult<()> {
        let conn = self.open_read_only()?;
        let mut stmt =
            conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
        for width in widths {
            let table = width.table_name();
            if !stmt.exists(params![table])? {
                return Err(OverfetchError::MissingTable(table));
            }
        }
        Ok(())
    }

    /// Number of rows in `width`'s table carrying `id`.
    pub fn count_rows_with_id(&self, width: TableWidth, id: RecordId) -> OverfetchResult<usize> {
        let conn = self.open_read_only()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE Id = ?1", width.table_name()),
            params![id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Total number of rows in `width`'s table.
    pub fn row_count(&self, width: TableWidth) -> OverfetchResult<usize> {
        let conn = self.open_read_only()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", width.table_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// Runs `sql` bound to `id` and maps the single resulting row.
///
/// Fails with [`OverfetchError::NotExactlyOneRow`] if no row or a second row
/// is returned. At most two rows are read.
pub(crate) fn query_single<T, F>(
    conn: &Connection,
    sql: &str,
    width: TableWidth,
    id: RecordId,
    mut map: F,
) -> OverfetchResult<T>
where
    F: FnMut(&Row<'_>) -> OverfetchResult<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params![id])?;
    let not_exactly_one = |found| OverfetchError::NotExactlyOneRow {
        table: width.table_name(),
        id,
        found,
    };
    let Some(row) = rows.next()? else {
        return Err(not_exactly_one(0));
    };
    let value = map(row)?;
    if rows.next()?.is_some() {
        return Err(not_exactly_one(2));
    }
    Ok(value)
}
