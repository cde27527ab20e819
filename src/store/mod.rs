//! Row-store accessor: the one storage seam every resource goes through.
//!
//! Backends: PostgREST over HTTP, PostgreSQL via the SQL builder, and an in-memory store.

mod memory;
mod postgres;
mod postgrest;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgRowStore};
pub use postgrest::PostgrestStore;

use crate::config::TableDef;
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// One row as a JSON object keyed by column name.
pub type Record = Map<String, Value>;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: &str) -> Self {
        OrderBy {
            column: column.to_string(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        OrderBy {
            column: column.to_string(),
            direction: Direction::Desc,
        }
    }
}

/// Paging and ordering for `find_many`. Stores receive already-clamped values.
#[derive(Clone, Debug, PartialEq)]
pub struct FindOptions {
    pub limit: u32,
    pub offset: u32,
    pub order_by: Option<OrderBy>,
}

impl Default for FindOptions {
    fn default() -> Self {
        FindOptions {
            limit: DEFAULT_LIMIT,
            offset: 0,
            order_by: None,
        }
    }
}

impl FindOptions {
    /// Default limit 100, capped at 1000; offset defaults to 0.
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        FindOptions {
            limit: limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
            offset: offset.unwrap_or(0),
            order_by: None,
        }
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }
}

#[async_trait]
pub trait RowStore: Send + Sync {
    async fn find_many(
        &self,
        table: &TableDef,
        filters: &[(String, Value)],
        options: &FindOptions,
    ) -> Result<Vec<Record>, StoreError>;

    /// `Ok(None)` when no row has this id.
    async fn find_by_id(&self, table: &TableDef, id: &str) -> Result<Option<Record>, StoreError>;

    async fn create(&self, table: &TableDef, fields: &Record) -> Result<Record, StoreError>;

    /// `StoreError::RowMissing` when no row matched.
    async fn update(&self, table: &TableDef, id: &str, fields: &Record) -> Result<Record, StoreError>;

    /// `StoreError::RowMissing` when no row matched.
    async fn delete(&self, table: &TableDef, id: &str) -> Result<Record, StoreError>;

    /// Cheap round-trip used by the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Render a scalar the way it appears in a query string: strings bare, everything else as JSON.
pub(crate) fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Equality used for filters and id lookups: same-typed values compare directly,
/// mixed types (e.g. query string `"3"` against stored `3`) compare by text.
pub(crate) fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(_), Value::String(_)) | (Value::Bool(_), Value::Bool(_)) => a == b,
        (Value::Null, _) | (_, Value::Null) => false,
        _ => scalar_text(a) == scalar_text(b),
    }
}

/// Total order over JSON scalars with nulls sorting last (Postgres ascending semantics).
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => scalar_text(a).cmp(&scalar_text(b)),
    }
}
