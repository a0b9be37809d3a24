//! Core types for the overfetch benchmark harness: table widths, record
//! identities, the parameterized wide-record shape and its random factory.

pub mod factory;
pub mod identity;
pub mod record;
pub mod schema;

pub use factory::RecordFactory;
pub use identity::{RecordId, RunIdentity};
pub use record::WideRecord;
pub use schema::TableWidth;

use thiserror::Error;

/// Convenience alias for results returned from schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while describing, building or decoding records.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Wrapper around rusqlite errors raised while decoding rows.
    #[error("{0}")]
    SqliteError(#[from] rusqlite::Error),
    /// A width outside of the fixed set of table widths was requested.
    #[error("unsupported table width: {0} (expected one of 4, 8, 16, 32, 64, 128, 256, 512)")]
    UnsupportedWidth(usize),
    /// A width string could not be parsed as an integer.
    #[error("invalid table width \"{0}\"")]
    InvalidWidth(String),
    /// A record was built with the wrong number of filler values.
    #[error("table width {width} requires {width} filler values, found {found}")]
    FillerCountMismatch {
        /// Declared width of the table.
        width: TableWidth,
        /// Number of filler values supplied.
        found: usize,
    },
    /// A record was built with an empty email.
    #[error("record {id} has an empty email")]
    EmptyEmail {
        /// Identity of the offending record.
        id: RecordId,
    },
    /// A stored identity is not a valid UUID.
    #[error("{0}")]
    InvalidIdentity(#[from] uuid::Error),
}

/// Re-exports for the most common types.
pub mod prelude {
    pub use crate::{
        factory::RecordFactory,
        identity::{RecordId, RunIdentity},
        record::WideRecord,
        schema::TableWidth,
        SchemaError, SchemaResult,
    };
}
