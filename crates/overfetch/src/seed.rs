//! Bulk and run-row seeding.

use log::info;
use overfetch_core::{RecordFactory, RunIdentity, TableWidth, WideRecord};
use rusqlite::Connection;

use crate::{config::DEFAULT_BULK_ROWS, Config, Database, OverfetchResult};

/// Populates the wide tables.
///
/// Seeding is additive: nothing is ever deleted, so repeated bulk seeding
/// accumulates rows and every benchmark process leaves its run rows behind.
#[derive(Debug, Clone)]
pub struct Seeder {
    database: Database,
    widths: Vec<TableWidth>,
    bulk_rows: usize,
}

impl Seeder {
    /// A seeder for the configured database, widths and bulk row count.
    pub fn new(config: &Config) -> Self {
        Self {
            database: Database::new(&config.database),
            widths: config.widths.clone(),
            bulk_rows: config.bulk_rows,
        }
    }

    /// A seeder for `widths` with the default bulk row count.
    pub fn with_widths(database: Database, widths: impl IntoIterator<Item = TableWidth>) -> Self {
        Self {
            database,
            widths: widths.into_iter().collect(),
            bulk_rows: DEFAULT_BULK_ROWS,
        }
    }

    /// Sets the number of random rows bulk-seeded per width.
    pub fn bulk_rows(mut self, bulk_rows: usize) -> Self {
        self.bulk_rows = bulk_rows;
        self
    }

    /// Widths this seeder writes to.
    pub fn widths(&self) -> &[TableWidth] {
        &self.widths
    }

    /// The one-shot `seed` action: schema, bulk rows, then run rows.
    pub fn seed(&self, run_identity: RunIdentity) -> OverfetchResult<()> {
        self.database.ensure_schema()?;
        self.seed_bulk()?;
        self.seed_run_rows(run_identity)
    }

    /// Creates the tables and email indexes if they are missing.
    pub fn ensure_schema(&self) -> OverfetchResult<()> {
        self.database.ensure_schema()
    }

    /// Inserts `bulk_rows` random rows into every configured width's table in
    /// a single transaction.
    pub fn seed_bulk(&self) -> OverfetchResult<()> {
        let mut factory = RecordFactory::from_entropy();
        let mut conn = self.database.open_read_write()?;
        let tx = conn.transaction()?;
        for &width in &self.widths {
            let records = factory.create_many(width, self.bulk_rows);
            insert_records(&tx, width, &records)?;
            info!("queued {} bulk rows for {}", records.len(), width.table_name());
        }
        tx.commit()?;
        info!("committed bulk seed for {} tables", self.widths.len());
        Ok(())
    }

    /// Inserts exactly one row tagged with `run_identity` into every
    /// configured width's table. Either every row is committed or none is.
    pub fn seed_run_rows(&self, run_identity: RunIdentity) -> OverfetchResult<()> {
        let mut factory = RecordFactory::from_entropy();
        let mut conn = self.database.open_read_write()?;
        let tx = conn.transaction()?;
        for &width in &self.widths {
            let record = factory.create_with_id(width, run_identity);
            insert_records(&tx, width, std::slice::from_ref(&record))?;
        }
        tx.commit()?;
        info!(
            "seeded run rows for {run_identity} in {} tables",
            self.widths.len()
        );
        Ok(())
    }
}

fn insert_records(
    conn: &Connection,
    width: TableWidth,
    records: &[WideRecord],
) -> OverfetchResult<()> {
    let mut stmt = conn.prepare_cached(&width.insert_sql())?;
    for record in records {
        stmt.execute(record.insert_params().as_slice())?;
    }
    Ok(())
}
