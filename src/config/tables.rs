//! Static table definitions: the columns each resource persists, their Postgres types and defaults.

use serde_json::{Map, Value};

/// Default a store applies when an insert omits the column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnDefault {
    /// Generated identifier (bigserial).
    Identity,
    /// Current timestamp.
    Now,
    Bool(bool),
    Int(i64),
    Text(&'static str),
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    /// PostgreSQL type used for DDL and for casting bound parameters.
    pub pg_type: &'static str,
    pub nullable: bool,
    pub default: Option<ColumnDefault>,
}

#[derive(Clone, Copy, Debug)]
pub struct ForeignKey {
    pub column: &'static str,
    pub table: &'static str,
    pub references: &'static str,
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub pk: &'static str,
    pub columns: &'static [ColumnDef],
    pub unique: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Whether `id` can name a row at all. Integer keys reject anything that does not parse,
    /// so a malformed id behaves like an absent one on every backend.
    pub fn accepts_id(&self, id: &str) -> bool {
        match self.column(self.pk).map(|c| c.pg_type) {
            Some("bigint") | Some("integer") => id.trim().parse::<i64>().is_ok(),
            _ => true,
        }
    }

    /// Drop every key that is not a column of this table.
    pub fn retain_known(&self, record: &mut Map<String, Value>) {
        record.retain(|k, _| self.has_column(k));
    }
}

const fn col(name: &'static str, pg_type: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        pg_type,
        nullable: true,
        default: None,
    }
}

const fn required(name: &'static str, pg_type: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        pg_type,
        nullable: false,
        default: None,
    }
}

const fn defaulted(name: &'static str, pg_type: &'static str, default: ColumnDefault) -> ColumnDef {
    ColumnDef {
        name,
        pg_type,
        nullable: false,
        default: Some(default),
    }
}

const ID: ColumnDef = defaulted("id", "bigint", ColumnDefault::Identity);
const CREATE_TIME: ColumnDef = defaulted("create_time", "timestamptz", ColumnDefault::Now);
const MODIFY_TIME: ColumnDef = defaulted("modify_time", "timestamptz", ColumnDefault::Now);

pub const MODIFY_TIME_COLUMN: &str = "modify_time";
pub const CREATE_TIME_COLUMN: &str = "create_time";

pub static EXAMPLES: TableDef = TableDef {
    name: "examples",
    pk: "id",
    columns: &[
        ID,
        required("name", "text"),
        col("description", "text"),
        CREATE_TIME,
        MODIFY_TIME,
    ],
    unique: &[],
    foreign_keys: &[],
};

pub static NONCONFORMANCE_CATEGORIES: TableDef = TableDef {
    name: "nonconformance_categories",
    pk: "id",
    columns: &[
        ID,
        required("name", "text"),
        col("description", "text"),
        defaulted("is_active", "boolean", ColumnDefault::Bool(true)),
        CREATE_TIME,
        MODIFY_TIME,
    ],
    unique: &[],
    foreign_keys: &[],
};

pub static NONCONFORMANCE_REPORTS: TableDef = TableDef {
    name: "nonconformance_reports",
    pk: "id",
    columns: &[
        ID,
        required("report_number", "text"),
        required("title", "text"),
        required("description", "text"),
        required("date_occurred", "date"),
        required("reported_by_user_id", "bigint"),
        required("severity_level", "text"),
        required("category", "text"),
        defaulted("status", "text", ColumnDefault::Text("open")),
        defaulted("priority_score", "integer", ColumnDefault::Int(5)),
        col("location", "text"),
        col("job_site", "text"),
        defaulted("customer_notified", "boolean", ColumnDefault::Bool(false)),
        col("estimated_cost", "double precision"),
        col("immediate_action_taken", "text"),
        col("root_cause_analysis", "text"),
        CREATE_TIME,
        MODIFY_TIME,
    ],
    unique: &["report_number"],
    foreign_keys: &[],
};

pub static CORRECTIVE_ACTIONS: TableDef = TableDef {
    name: "corrective_actions",
    pk: "id",
    columns: &[
        ID,
        required("nonconformance_report_id", "bigint"),
        required("action_description", "text"),
        required("action_type", "text"),
        col("assigned_to", "text"),
        col("target_completion_date", "date"),
        col("actual_completion_date", "date"),
        defaulted("status", "text", ColumnDefault::Text("planned")),
        col("verification_notes", "text"),
        CREATE_TIME,
        MODIFY_TIME,
    ],
    unique: &[],
    foreign_keys: &[ForeignKey {
        column: "nonconformance_report_id",
        table: "nonconformance_reports",
        references: "id",
    }],
};

/// All tables in creation order (referenced tables first).
pub static ALL_TABLES: [&TableDef; 4] = [
    &EXAMPLES,
    &NONCONFORMANCE_CATEGORIES,
    &NONCONFORMANCE_REPORTS,
    &CORRECTIVE_ACTIONS,
];
