//! Quality dashboard backend: nonconformance reports, corrective actions and categories
//! served as JSON CRUD routes over a pluggable row store.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{Settings, StoreBackend, TableDef, ALL_TABLES};
pub use error::{AppError, ConfigError, StoreError};
pub use migration::apply_migrations;
pub use response::{created_one, success_many, success_one};
pub use routes::{app, common_routes, resource_routes};
pub use service::CrudService;
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgRowStore, PostgrestStore, RowStore};
