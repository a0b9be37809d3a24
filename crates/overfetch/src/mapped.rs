//! A small entity-mapping layer in the style of an ORM.
//!
//! A shared [`Model`] holds per-width entity metadata and the SQL generated
//! from it. Each query runs inside a short-lived [`Session`] that owns one
//! connection and, when tracking is enabled, an identity map with a snapshot
//! of every materialized entity's original values.

use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use itertools::Itertools;
use overfetch_core::{
    schema::{EMAIL_COLUMN, ID_COLUMN},
    RecordId, TableWidth, WideRecord,
};
use parking_lot::RwLock;
use rusqlite::Connection;

use crate::{
    database::query_single, Database, OverfetchError, OverfetchResult, QueryStrategy, StrategyKind,
};

/// Whether a session records the entities it materializes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum QueryTracking {
    /// Keep an identity map and original-value snapshots.
    #[default]
    TrackAll,
    /// Hand out entities without recording them.
    NoTracking,
}

/// Mapping metadata for one width's table.
#[derive(Debug)]
pub struct EntityModel {
    width: TableWidth,
    table: String,
    columns: Vec<String>,
    select_single_sql: String,
}

impl EntityModel {
    fn build(width: TableWidth) -> Self {
        let table = width.table_name();
        let columns = width.columns();
        let select_single_sql = format!(
            "SELECT {} FROM {table} WHERE {ID_COLUMN} = ?1 LIMIT 2",
            columns.iter().join(", ")
        );
        Self {
            width,
            table,
            columns,
            select_single_sql,
        }
    }

    /// Width this entity maps.
    pub fn width(&self) -> TableWidth {
        self.width
    }
    /// Backing table name.
    pub fn table(&self) -> &str {
        &self.table
    }
    /// Mapped columns in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    /// Statement materializing a whole entity by identity.
    pub fn select_single_sql(&self) -> &str {
        &self.select_single_sql
    }

    /// Statement projecting one mapped column by identity.
    pub fn project_single_sql(&self, column: &str) -> OverfetchResult<String> {
        if !self.columns.iter().any(|c| c == column) {
            return Err(OverfetchError::UnknownColumn {
                table: self.table.clone(),
                column: column.to_string(),
            });
        }
        Ok(format!(
            "SELECT {column} FROM {} WHERE {ID_COLUMN} = ?1 LIMIT 2",
            self.table
        ))
    }
}

/// Lazily built entity metadata shared by every session of a strategy.
#[derive(Debug, Default)]
pub struct Model {
    entities: RwLock<HashMap<TableWidth, Arc<EntityModel>>>,
}

impl Model {
    /// Returns the metadata for `width`, building it on first use.
    pub fn entity(&self, width: TableWidth) -> Arc<EntityModel> {
        if let Some(entity) = self.entities.read().get(&width) {
            return entity.clone();
        }
        self.entities
            .write()
            .entry(width)
            .or_insert_with(|| Arc::new(EntityModel::build(width)))
            .clone()
    }
}

#[derive(Debug)]
struct TrackedEntity {
    entity: Arc<WideRecord>,
    original: WideRecord,
}

/// A unit of work over one connection.
pub struct Session<'m> {
    connection: Connection,
    model: &'m Model,
    tracking: QueryTracking,
    identity_map: DashMap<(TableWidth, RecordId), TrackedEntity>,
}

impl<'m> Session<'m> {
    /// Opens a read-only session.
    pub fn open(
        database: &Database,
        model: &'m Model,
        tracking: QueryTracking,
    ) -> OverfetchResult<Self> {
        Ok(Self {
            connection: database.open_read_only()?,
            model,
            tracking,
            identity_map: DashMap::new(),
        })
    }

    /// Materializes the single entity of `width` with identity `id`.
    ///
    /// With tracking enabled, an entity that is already tracked is returned
    /// as-is and the freshly read values are discarded.
    pub fn single(&self, width: TableWidth, id: RecordId) -> OverfetchResult<Arc<WideRecord>> {
        let entity_model = self.model.entity(width);
        let record = query_single(
            &self.connection,
            entity_model.select_single_sql(),
            width,
            id,
            |row| Ok(WideRecord::from_row(width, row)?),
        )?;
        match self.tracking {
            QueryTracking::NoTracking => Ok(Arc::new(record)),
            QueryTracking::TrackAll => Ok(self
                .identity_map
                .entry((width, id))
                .or_insert_with(|| TrackedEntity {
                    original: record.clone(),
                    entity: Arc::new(record),
                })
                .entity
                .clone()),
        }
    }

    /// Projects one column of the single row with identity `id`. Projections
    /// are never tracked.
    pub fn single_column(
        &self,
        width: TableWidth,
        id: RecordId,
        column: &str,
    ) -> OverfetchResult<String> {
        let sql = self.model.entity(width).project_single_sql(column)?;
        query_single(&self.connection, &sql, width, id, |row| Ok(row.get(0)?))
    }

    /// Number of entities in the identity map.
    pub fn tracked_len(&self) -> usize {
        self.identity_map.len()
    }

    /// Whether the entity `(width, id)` is tracked.
    pub fn is_tracked(&self, width: TableWidth, id: RecordId) -> bool {
        self.identity_map.contains_key(&(width, id))
    }

    /// The values a tracked entity had when it was first materialized.
    pub fn original_values(&self, width: TableWidth, id: RecordId) -> Option<WideRecord> {
        self.identity_map
            .get(&(width, id))
            .map(|tracked| tracked.original.clone())
    }
}

/// ORM-style strategy: whole-row reads materialize entities through a session.
#[derive(Debug)]
pub struct MappedStrategy {
    database: Database,
    model: Model,
    tracking: QueryTracking,
}

impl MappedStrategy {
    /// A strategy over `database` with the given tracking behaviour.
    pub fn new(database: Database, tracking: QueryTracking) -> Self {
        Self {
            database,
            model: Model::default(),
            tracking,
        }
    }

    /// Opens a session sharing this strategy's model.
    pub fn session(&self) -> OverfetchResult<Session<'_>> {
        Session::open(&self.database, &self.model, self.tracking)
    }
}

impl QueryStrategy for MappedStrategy {
    fn kind(&self) -> StrategyKind {
        match self.tracking {
            QueryTracking::TrackAll => StrategyKind::Orm,
            QueryTracking::NoTracking => StrategyKind::OrmNoTracking,
        }
    }

    fn fetch_full(&self, width: TableWidth, id: RecordId) -> OverfetchResult<String> {
        let session = self.session()?;
        let entity = session.single(width, id)?;
        Ok(entity.email().to_string())
    }

    fn fetch_projected(&self, width: TableWidth, id: RecordId) -> OverfetchResult<String> {
        self.session()?.single_column(width, id, EMAIL_COLUMN)
    }
}
