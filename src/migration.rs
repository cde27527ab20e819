//! Create the resource tables from their static definitions.
//! Order follows foreign-key dependencies (see `ALL_TABLES`).

use crate::config::{ColumnDef, ColumnDefault, TableDef, ALL_TABLES};
use crate::error::StoreError;
use crate::sql::quoted;
use sqlx::PgPool;

fn column_sql(table: &TableDef, c: &ColumnDef) -> String {
    let mut def = format!("{} {}", quoted(c.name), c.pg_type);
    match c.default {
        Some(ColumnDefault::Identity) => def.push_str(" GENERATED BY DEFAULT AS IDENTITY"),
        Some(ColumnDefault::Now) => def.push_str(" DEFAULT NOW()"),
        Some(ColumnDefault::Bool(b)) => def.push_str(if b { " DEFAULT TRUE" } else { " DEFAULT FALSE" }),
        Some(ColumnDefault::Int(n)) => def.push_str(&format!(" DEFAULT {}", n)),
        Some(ColumnDefault::Text(s)) => def.push_str(&format!(" DEFAULT '{}'", s.replace('\'', "''"))),
        None => {}
    }
    if c.name == table.pk {
        def.push_str(" PRIMARY KEY");
    } else if !c.nullable {
        def.push_str(" NOT NULL");
    }
    def
}

/// `CREATE TABLE IF NOT EXISTS` for one table, with unique and foreign-key constraints inline.
pub fn create_table_sql(table: &TableDef) -> String {
    let mut parts: Vec<String> = table.columns.iter().map(|c| column_sql(table, c)).collect();
    for col in table.unique {
        parts.push(format!("UNIQUE ({})", quoted(col)));
    }
    for fk in table.foreign_keys {
        parts.push(format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            quoted(fk.column),
            quoted(fk.table),
            quoted(fk.references)
        ));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quoted(table.name),
        parts.join(",\n    ")
    )
}

/// Idempotent: existing tables are left as they are.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), StoreError> {
    for table in ALL_TABLES {
        let ddl = create_table_sql(table);
        tracing::debug!(sql = %ddl, "migration");
        sqlx::query(&ddl).execute(pool).await?;
        for fk in table.foreign_keys {
            let index = format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("{}_{}_idx", table.name, fk.column)),
                quoted(table.name),
                quoted(fk.column)
            );
            sqlx::query(&index).execute(pool).await?;
        }
    }
    tracing::info!(tables = ALL_TABLES.len(), "migrations applied");
    Ok(())
}
