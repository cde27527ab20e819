//! Service layer: table-bound CRUD, validation, coercion and derived fields.

pub mod coerce;
mod crud;
pub mod report_number;
pub mod summary;
mod validation;

pub use coerce::{coerce_fields, Coercion};
pub use crud::CrudService;
pub use report_number::generate_report_number;
pub use summary::{quality_summary, QualitySummary};
pub use validation::{is_blank, RequestValidator};
