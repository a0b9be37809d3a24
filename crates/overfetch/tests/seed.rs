//! Seeding behaviour: schema creation, run rows and additivity.

mod common;

use common::{TestDb, BULK_ROWS};
use overfetch::prelude::*;

#[test]
fn ensure_schema_creates_all_eight_tables() -> OverfetchResult<()> {
    let db = TestDb::empty();
    db.database.ensure_schema()?;
    db.database.verify_schema(&TableWidth::all())?;
    // Creating twice is harmless.
    db.database.ensure_schema()?;
    for width in TableWidth::all() {
        assert_eq!(db.database.row_count(width)?, 0);
    }
    Ok(())
}

#[test]
fn verify_schema_reports_the_missing_table() -> OverfetchResult<()> {
    let db = TestDb::empty();
    let conn = db.database.open_read_write()?;
    conn.execute(&TableWidth::W4.create_table_sql(), [])?;
    drop(conn);

    db.database.verify_schema(&[TableWidth::W4])?;
    let err = db
        .database
        .verify_schema(&[TableWidth::W4, TableWidth::W64])
        .unwrap_err();
    assert!(matches!(&err, OverfetchError::MissingTable(t) if t == "Table64"));
    assert_eq!(err.kind(), ErrorKind::Setup);
    Ok(())
}

#[test]
fn bulk_seed_fills_only_configured_widths() -> OverfetchResult<()> {
    let widths = [TableWidth::W4, TableWidth::W128];
    let db = TestDb::seeded(&widths);
    assert_eq!(db.database.row_count(TableWidth::W4)?, BULK_ROWS);
    assert_eq!(db.database.row_count(TableWidth::W128)?, BULK_ROWS);
    assert_eq!(db.database.row_count(TableWidth::W8)?, 0);
    Ok(())
}

#[test]
fn run_rows_tag_exactly_one_row_per_width() -> OverfetchResult<()> {
    let widths = TableWidth::all();
    let db = TestDb::seeded(&widths);
    let run = RunIdentity::generate();
    db.seeder(&widths).seed_run_rows(run)?;
    for width in widths {
        assert_eq!(db.database.count_rows_with_id(width, run)?, 1, "{width}");
        assert_eq!(db.database.row_count(width)?, BULK_ROWS + 1);
        assert!(!db.email_of(width, run).is_empty());
    }
    Ok(())
}

#[test]
fn run_rows_have_exactly_width_fillers() -> OverfetchResult<()> {
    let widths = [TableWidth::W16, TableWidth::W512];
    let db = TestDb::seeded(&widths);
    let run = RunIdentity::generate();
    db.seeder(&widths).seed_run_rows(run)?;
    let conn = db.database.open_read_only()?;
    for width in widths {
        let mut stmt = conn.prepare(&format!("SELECT * FROM {} WHERE Id = ?1", width.table_name()))?;
        let mut rows = stmt.query([run])?;
        let row = rows.next()?.expect("run row is missing");
        let record = WideRecord::from_row(width, row)?;
        assert_eq!(record.fields().len(), width.filler_count());
        assert!(record.fields().iter().all(|f| !f.is_empty()));
    }
    Ok(())
}

#[test]
fn seeding_is_additive() -> OverfetchResult<()> {
    let widths = [TableWidth::W4, TableWidth::W32];
    let db = TestDb::empty();
    let seeder = db.seeder(&widths);

    let first = RunIdentity::generate();
    seeder.seed(first)?;
    let first_emails: Vec<String> = widths.iter().map(|&w| db.email_of(w, first)).collect();

    let second = RunIdentity::generate();
    seeder.seed(second)?;

    for (width, email) in widths.iter().zip(&first_emails) {
        assert_eq!(db.database.count_rows_with_id(*width, first)?, 1);
        assert_eq!(db.database.count_rows_with_id(*width, second)?, 1);
        assert_eq!(&db.email_of(*width, first), email);
        assert_eq!(db.database.row_count(*width)?, 2 * (BULK_ROWS + 1));
    }
    Ok(())
}

#[test]
fn reusing_a_run_identity_commits_nothing() -> OverfetchResult<()> {
    let widths = [TableWidth::W4, TableWidth::W8];
    let db = TestDb::seeded(&widths);
    let run = RunIdentity::generate();
    // Occupy the identity in the second table only.
    db.seeder(&[TableWidth::W8]).seed_run_rows(run)?;

    let err = db.seeder(&widths).seed_run_rows(run).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Setup);
    assert_eq!(db.database.count_rows_with_id(TableWidth::W4, run)?, 0);
    assert_eq!(db.database.count_rows_with_id(TableWidth::W8, run)?, 1);
    Ok(())
}

#[test]
fn seeding_without_schema_fails() {
    let db = TestDb::empty();
    let err = db
        .seeder(&[TableWidth::W4])
        .seed_run_rows(RunIdentity::generate())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Setup);
}
