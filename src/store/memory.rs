//! In-process row store. Same filter, order and paging semantics as the SQL backends.

use super::{compare_values, loose_eq, FindOptions, Record, RowStore};
use crate::config::{ColumnDefault, TableDef};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct TableRows {
    next_id: i64,
    rows: BTreeMap<i64, Record>,
}

/// Rows keyed by table name then id. The lock is never held across an await.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<&'static str, TableRows>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, TableRows>> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn parse_id(id: &str) -> Option<i64> {
    id.trim().parse().ok()
}

fn default_value(default: ColumnDefault, next_id: i64) -> Value {
    match default {
        ColumnDefault::Identity => Value::from(next_id),
        ColumnDefault::Now => Value::String(chrono::Utc::now().to_rfc3339()),
        ColumnDefault::Bool(b) => Value::Bool(b),
        ColumnDefault::Int(n) => Value::from(n),
        ColumnDefault::Text(s) => Value::String(s.to_string()),
    }
}

/// Same rule Postgres enforces with NOT NULL (23502).
fn check_not_null(table: &TableDef, row: &Record) -> Result<(), StoreError> {
    match table
        .columns
        .iter()
        .find(|c| !c.nullable && row.get(c.name).map(Value::is_null).unwrap_or(true))
    {
        Some(c) => Err(StoreError::NullColumn {
            table: table.name,
            column: c.name,
        }),
        None => Ok(()),
    }
}

fn check_unique(
    table: &TableDef,
    rows: &TableRows,
    candidate: &Record,
    skip_id: Option<i64>,
) -> Result<(), StoreError> {
    for col in table.unique {
        let Some(v) = candidate.get(*col).filter(|v| !v.is_null()) else { continue };
        let clash = rows
            .rows
            .iter()
            .filter(|(id, _)| Some(**id) != skip_id)
            .any(|(_, row)| row.get(*col).map(|o| loose_eq(o, v)).unwrap_or(false));
        if clash {
            return Err(StoreError::Conflict(format!(
                "duplicate key value violates unique constraint on {}.{}",
                table.name, col
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn find_many(
        &self,
        table: &TableDef,
        filters: &[(String, Value)],
        options: &FindOptions,
    ) -> Result<Vec<Record>, StoreError> {
        let guard = self.lock();
        let Some(t) = guard.get(table.name) else {
            return Ok(Vec::new());
        };
        let mut matched: Vec<(&i64, &Record)> = t
            .rows
            .iter()
            .filter(|(_, row)| {
                filters.iter().all(|(col, want)| {
                    row.get(col).map(|have| loose_eq(have, want)).unwrap_or(false)
                })
            })
            .collect();
        if let Some(order) = &options.order_by {
            matched.sort_by(|(ida, a), (idb, b)| {
                let null = Value::Null;
                let va = a.get(&order.column).unwrap_or(&null);
                let vb = b.get(&order.column).unwrap_or(&null);
                let ord = match order.direction {
                    super::Direction::Asc => compare_values(va, vb),
                    super::Direction::Desc => compare_values(vb, va),
                };
                match ord {
                    Ordering::Equal => ida.cmp(idb),
                    other => other,
                }
            });
        }
        Ok(matched
            .into_iter()
            .skip(options.offset as usize)
            .take(options.limit as usize)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn find_by_id(&self, table: &TableDef, id: &str) -> Result<Option<Record>, StoreError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let guard = self.lock();
        Ok(guard.get(table.name).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn create(&self, table: &TableDef, fields: &Record) -> Result<Record, StoreError> {
        let mut guard = self.lock();
        let rows = guard.entry(table.name).or_default();
        let id = rows.next_id + 1;
        let mut row = Record::new();
        for c in table.columns {
            let value = if c.name == table.pk {
                Value::from(id)
            } else {
                match (fields.get(c.name), c.default) {
                    (Some(v), _) if !v.is_null() => v.clone(),
                    (_, Some(d)) => default_value(d, id),
                    (Some(v), None) => v.clone(),
                    (None, None) => Value::Null,
                }
            };
            row.insert(c.name.to_string(), value);
        }
        check_not_null(table, &row)?;
        check_unique(table, rows, &row, None)?;
        rows.next_id = id;
        rows.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, table: &TableDef, id: &str, fields: &Record) -> Result<Record, StoreError> {
        let missing = || StoreError::RowMissing {
            table: table.name,
            id: id.to_string(),
        };
        let key = parse_id(id).ok_or_else(missing)?;
        let mut guard = self.lock();
        let rows = guard.get_mut(table.name).ok_or_else(missing)?;
        let mut row = rows.rows.get(&key).cloned().ok_or_else(missing)?;
        for (k, v) in fields {
            if k == table.pk || !table.has_column(k) {
                continue;
            }
            row.insert(k.clone(), v.clone());
        }
        check_not_null(table, &row)?;
        check_unique(table, rows, &row, Some(key))?;
        rows.rows.insert(key, row.clone());
        Ok(row)
    }

    async fn delete(&self, table: &TableDef, id: &str) -> Result<Record, StoreError> {
        let missing = || StoreError::RowMissing {
            table: table.name,
            id: id.to_string(),
        };
        let key = parse_id(id).ok_or_else(missing)?;
        let mut guard = self.lock();
        guard
            .get_mut(table.name)
            .and_then(|t| t.rows.remove(&key))
            .ok_or_else(missing)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
