#![allow(dead_code)]

use overfetch::prelude::*;
use rusqlite::{params, Connection};
use tempfile::TempDir;

pub const BULK_ROWS: usize = 25;

/// A throwaway database directory; the file lives as long as the guard.
pub struct TestDb {
    pub dir: TempDir,
    pub database: Database,
}

impl TestDb {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let database = Database::at(dir.path().join("overfetch.sqlite"));
        Self { dir, database }
    }

    /// Schema plus bulk rows for `widths`.
    pub fn seeded(widths: &[TableWidth]) -> Self {
        let db = Self::empty();
        let seeder = db.seeder(widths);
        seeder.ensure_schema().expect("failed to create schema");
        seeder.seed_bulk().expect("failed to bulk seed");
        db
    }

    pub fn seeder(&self, widths: &[TableWidth]) -> Seeder {
        Seeder::with_widths(self.database.clone(), widths.iter().copied()).bulk_rows(BULK_ROWS)
    }

    pub fn config(&self, widths: &[TableWidth]) -> Config {
        Config::default()
            .with_database(self.database.path())
            .with_widths(widths.iter().copied())
            .with_bulk_rows(BULK_ROWS)
            .with_artifacts_dir(self.dir.path().join("artifacts"))
            .with_measurement(quick_measurement())
    }

    /// Adds a nullable column to `width`'s table so `SELECT *` no longer
    /// matches the width's column count.
    pub fn add_stray_column(&self, width: TableWidth) {
        let conn = Connection::open(self.database.path()).expect("failed to open database");
        conn.execute(
            &format!("ALTER TABLE {} ADD COLUMN Stray TEXT", width.table_name()),
            [],
        )
        .expect("failed to alter table");
    }

    /// Reads the stored email of the row with `id` directly.
    pub fn email_of(&self, width: TableWidth, id: RecordId) -> String {
        let conn = Connection::open(self.database.path()).expect("failed to open database");
        conn.query_row(
            &format!("SELECT Email FROM {} WHERE Id = ?1", width.table_name()),
            params![id],
            |row| row.get(0),
        )
        .expect("row is missing")
    }
}

pub fn quick_measurement() -> MeasurementConfig {
    MeasurementConfig {
        warmup_iterations: 1,
        iterations_per_sample: 2,
        min_samples: 2,
        max_samples: 3,
        target_relative_error: 1.0,
    }
}
