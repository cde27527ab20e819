//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a table definition.

use crate::config::{ColumnDef, TableDef};
use crate::store::{Direction, FindOptions, Record};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from static table definitions).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value and return its placeholder, cast to the column type.
    fn push_cast(&mut self, v: Value, col: &ColumnDef) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), col.pg_type)
    }
}

fn returning_list(table: &TableDef) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn order_clause(table: &TableDef, options: &FindOptions) -> String {
    let pk = quoted(table.pk);
    match &options.order_by {
        Some(o) if table.has_column(&o.column) && o.column != table.pk => {
            let dir = match o.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            format!(" ORDER BY {} {}, {} ASC", quoted(&o.column), dir, pk)
        }
        Some(o) if o.column == table.pk && o.direction == Direction::Desc => {
            format!(" ORDER BY {} DESC", pk)
        }
        _ => format!(" ORDER BY {} ASC", pk),
    }
}

/// SELECT by primary key. Caller binds the id as `$1`.
pub fn select_by_id(table: &TableDef) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1::{}",
        returning_list(table),
        quoted(table.name),
        quoted(table.pk),
        pk_type(table)
    )
}

/// SELECT with exact-match filters (AND), ORDER BY, LIMIT and OFFSET.
/// Filters on columns the table does not have are skipped.
pub fn select_list(table: &TableDef, filters: &[(String, Value)], options: &FindOptions) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (name, val) in filters {
        let Some(col) = table.column(name) else { continue };
        let ph = q.push_cast(val.clone(), col);
        where_parts.push(format!("{} = {}", quoted(col.name), ph));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        returning_list(table),
        quoted(table.name),
        where_clause,
        order_clause(table, options),
        options.limit,
        options.offset
    );
    q
}

/// INSERT the known columns present in `body`; omitted columns fall back to their DB default.
/// The primary key is always generated by the database.
pub fn insert(table: &TableDef, body: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in table.columns {
        if c.name == table.pk {
            continue;
        }
        let Some(val) = body.get(c.name) else { continue };
        if val.is_null() && c.default.is_some() {
            continue;
        }
        placeholders.push(q.push_cast(val.clone(), c));
        cols.push(quoted(c.name));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(table.name),
            returning_list(table)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(table.name),
            cols.join(", "),
            placeholders.join(", "),
            returning_list(table)
        )
    };
    q
}

/// UPDATE by id: SET only known, non-key columns present in body. With nothing to set,
/// degrades to a SELECT of the row so callers still observe absence.
pub fn update(table: &TableDef, id: &str, body: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in table.columns {
        if c.name == table.pk {
            continue;
        }
        let Some(val) = body.get(c.name) else { continue };
        let rhs = q.push_cast(val.clone(), c);
        sets.push(format!("{} = {}", quoted(c.name), rhs));
    }
    if sets.is_empty() {
        q.params.push(Value::String(id.to_string()));
        q.sql = select_by_id(table);
        return q;
    }
    q.params.push(Value::String(id.to_string()));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}::{} RETURNING {}",
        quoted(table.name),
        sets.join(", "),
        quoted(table.pk),
        q.params.len(),
        pk_type(table),
        returning_list(table)
    );
    q
}

/// DELETE by id, returning the removed row.
pub fn delete(table: &TableDef, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.params.push(Value::String(id.to_string()));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1::{} RETURNING {}",
        quoted(table.name),
        quoted(table.pk),
        pk_type(table),
        returning_list(table)
    );
    q
}

fn pk_type(table: &TableDef) -> &'static str {
    table.column(table.pk).map(|c| c.pg_type).unwrap_or("text")
}
