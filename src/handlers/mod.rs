//! HTTP handlers, one module per resource.

mod common;
pub mod categories;
pub mod corrective_actions;
pub mod examples;
pub mod reports;
pub mod summary;
