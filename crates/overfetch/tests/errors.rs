//! Error classification and where each kind of failure ends up.

mod common;

use common::TestDb;
use overfetch::prelude::*;

#[test]
fn error_kinds() {
    let id = RecordId::generate();
    let cases = [
        (
            OverfetchError::from(rusqlite::Error::QueryReturnedNoRows),
            ErrorKind::Setup,
        ),
        (
            OverfetchError::MissingTable("Table4".to_string()),
            ErrorKind::Setup,
        ),
        (
            OverfetchError::from(std::io::Error::other("disk full")),
            ErrorKind::Setup,
        ),
        (
            OverfetchError::NotExactlyOneRow {
                table: "Table4".to_string(),
                id,
                found: 2,
            },
            ErrorKind::InvariantViolation,
        ),
        (
            OverfetchError::EmailMismatch {
                table: "Table4".to_string(),
                id,
                full: "a@example.com".to_string(),
                projected: "b@example.com".to_string(),
            },
            ErrorKind::InvariantViolation,
        ),
        (
            OverfetchError::from(SchemaError::EmptyEmail { id }),
            ErrorKind::InvariantViolation,
        ),
        (
            OverfetchError::from(SchemaError::FillerCountMismatch {
                width: TableWidth::W4,
                found: 5,
            }),
            ErrorKind::UnsupportedParameter,
        ),
        (
            OverfetchError::from(SchemaError::UnsupportedWidth(5)),
            ErrorKind::UnsupportedParameter,
        ),
        (
            OverfetchError::from(SchemaError::InvalidWidth("wide".to_string())),
            ErrorKind::UnsupportedParameter,
        ),
        (
            OverfetchError::UnsupportedStrategy("linq".to_string()),
            ErrorKind::UnsupportedParameter,
        ),
        (
            OverfetchError::UnknownColumn {
                table: "Table4".to_string(),
                column: "Phone".to_string(),
            },
            ErrorKind::UnsupportedParameter,
        ),
        (
            OverfetchError::InvalidConfig("no widths".to_string()),
            ErrorKind::UnsupportedParameter,
        ),
    ];
    for (err, kind) in cases {
        assert_eq!(err.kind(), kind, "{err}");
    }
}

#[test]
fn misshapen_table_fails_only_its_cells() -> OverfetchResult<()> {
    let widths = [TableWidth::W4, TableWidth::W16];
    let db = TestDb::seeded(&widths);
    db.add_stray_column(TableWidth::W16);
    let config = db
        .config(&widths)
        .with_strategies([StrategyKind::Sql, StrategyKind::Orm]);

    let report = Runner::new(&config, RunIdentity::generate()).run()?;

    assert_eq!(report.cells.len(), 4);
    assert!(!report.is_success());
    for operation in [Operation::FetchFull, Operation::FetchProjected] {
        match report.outcome(TableWidth::W16, StrategyKind::Sql, operation) {
            Some(Outcome::Failed { kind, .. }) => {
                assert_eq!(*kind, ErrorKind::UnsupportedParameter);
            }
            other => panic!("expected a failed outcome, got {other:?}"),
        }
    }
    assert!(report.cell(TableWidth::W4, StrategyKind::Sql).unwrap().is_success());
    assert!(report.cell(TableWidth::W16, StrategyKind::Orm).unwrap().is_success());
    assert_eq!(report.failures().len(), 2);
    Ok(())
}
