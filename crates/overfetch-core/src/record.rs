//! The materialized wide-table row.

use rusqlite::{types::ToSql, Row};

use crate::{RecordId, SchemaError, SchemaResult, TableWidth};

/// A fully materialized row of one of the wide tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideRecord {
    pub(crate) width: TableWidth,
    pub(crate) id: RecordId,
    pub(crate) email: String,
    pub(crate) fields: Vec<String>,
}

impl WideRecord {
    /// Builds a record, checking the email is non-empty and that exactly
    /// `width` filler values were supplied.
    pub fn new(
        width: TableWidth,
        id: RecordId,
        email: impl Into<String>,
        fields: Vec<String>,
    ) -> SchemaResult<Self> {
        let email = email.into();
        if email.is_empty() {
            return Err(SchemaError::EmptyEmail { id });
        }
        if fields.len() != width.filler_count() {
            return Err(SchemaError::FillerCountMismatch {
                width,
                found: fields.len(),
            });
        }
        Ok(Self {
            width,
            id,
            email,
            fields,
        })
    }

    /// Decodes a row selected with every column in declaration order.
    pub fn from_row(width: TableWidth, row: &Row<'_>) -> SchemaResult<Self> {
        let column_count = row.as_ref().column_count();
        if column_count != width.column_count() {
            return Err(SchemaError::FillerCountMismatch {
                width,
                found: column_count.saturating_sub(2),
            });
        }
        let id: RecordId = row.get(0)?;
        let email: String = row.get(1)?;
        let fields = (2..column_count)
            .map(|i| row.get::<_, String>(i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(width, id, email, fields)
    }

    /// Width of the table this record belongs to.
    pub fn width(&self) -> TableWidth {
        self.width
    }
    /// Primary key.
    pub fn id(&self) -> RecordId {
        self.id
    }
    /// The projected email value.
    pub fn email(&self) -> &str {
        &self.email
    }
    /// Filler values, `Field1` first.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
    /// Consumes the record, returning its email.
    pub fn into_email(self) -> String {
        self.email
    }

    /// Positional parameters matching [`TableWidth::insert_sql`].
    pub fn insert_params(&self) -> Vec<&dyn ToSql> {
        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(self.width.column_count());
        params.push(&self.id);
        params.push(&self.email);
        params.extend(self.fields.iter().map(|f| f as &dyn ToSql));
        params
    }
}
