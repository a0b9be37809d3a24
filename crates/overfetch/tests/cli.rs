//! The `overfetch` command line: seed, then benchmark.

mod common;

use std::process::ExitCode;

use common::TestDb;
use overfetch::{cli::run_with_args, prelude::*};

fn args(db: &TestDb, extra: &[&str]) -> Vec<String> {
    let mut args = vec![
        "overfetch".to_string(),
        "--database".to_string(),
        db.database.path().display().to_string(),
        "--artifacts".to_string(),
        db.dir.path().join("artifacts").display().to_string(),
        "--widths".to_string(),
        "4,16".to_string(),
        "--bulk-rows".to_string(),
        "10".to_string(),
    ];
    args.extend(extra.iter().map(|s| (*s).to_string()));
    args
}

fn succeeded(code: ExitCode) -> bool {
    format!("{code:?}") == format!("{:?}", ExitCode::SUCCESS)
}

const QUICK: [&str; 10] = [
    "--warmup",
    "1",
    "--iterations",
    "2",
    "--min-samples",
    "2",
    "--max-samples",
    "3",
    "--target-error",
    "1.0",
];

#[test]
fn seed_then_benchmark_succeeds() -> OverfetchResult<()> {
    let db = TestDb::empty();
    let code = run_with_args(args(&db, &["SEED"]))?;
    assert!(succeeded(code));
    assert_eq!(db.database.row_count(TableWidth::W4)?, 11);
    assert_eq!(db.database.row_count(TableWidth::W16)?, 11);
    assert_eq!(db.database.row_count(TableWidth::W8)?, 0);

    let mut extra = vec!["run", "--strategies", "sql,orm"];
    extra.extend(QUICK);
    let code = run_with_args(args(&db, &extra))?;
    assert!(succeeded(code));
    assert_eq!(db.database.row_count(TableWidth::W4)?, 12);
    assert!(db.dir.path().join("artifacts").join("report.md").exists());
    assert!(db.dir.path().join("artifacts").join("report.json").exists());
    Ok(())
}

#[test]
fn benchmark_without_seed_is_a_setup_error() {
    let db = TestDb::empty();
    let err = run_with_args(args(&db, &QUICK)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Setup);
}

#[test]
fn failed_cell_fails_the_exit_code() -> OverfetchResult<()> {
    let db = TestDb::empty();
    assert!(succeeded(run_with_args(args(&db, &["seed"]))?));
    db.add_stray_column(TableWidth::W16);

    let mut extra = vec!["--strategies", "sql"];
    extra.extend(QUICK);
    let code = run_with_args(args(&db, &extra))?;
    assert!(!succeeded(code));
    let markdown = std::fs::read_to_string(db.dir.path().join("artifacts").join("report.md"))?;
    assert!(markdown.contains("## Failures"));
    Ok(())
}

#[test]
fn options_fall_back_to_the_environment() -> OverfetchResult<()> {
    let db = TestDb::empty();
    std::env::set_var("OVERFETCH_BULK_ROWS", "3");
    let code = run_with_args([
        "overfetch".to_string(),
        "seed".to_string(),
        "--database".to_string(),
        db.database.path().display().to_string(),
        "--widths".to_string(),
        "4".to_string(),
    ]);
    std::env::remove_var("OVERFETCH_BULK_ROWS");
    assert!(succeeded(code?));
    assert_eq!(db.database.row_count(TableWidth::W4)?, 4);
    Ok(())
}
