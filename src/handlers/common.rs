//! Steps every resource handler shares: single-record reads, paged lists, checked update/delete.

use crate::config::MODIFY_TIME_COLUMN;
use crate::error::AppError;
use crate::response::{success_many, success_one};
use crate::service::CrudService;
use crate::store::{FindOptions, Record};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

pub(crate) fn now_timestamp() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339())
}

/// Every update carries a fresh modification time, whatever the client sent.
pub(crate) fn stamp_modified(body: &mut Record) {
    body.insert(MODIFY_TIME_COLUMN.to_string(), now_timestamp());
}

pub(crate) async fn read_one(crud: &CrudService, id: &str, not_found: &str) -> Result<Response, AppError> {
    let row = crud.find_existing(id, not_found).await?;
    Ok(success_one(row).into_response())
}

pub(crate) async fn list_page(
    crud: &CrudService,
    filters: &[(String, Value)],
    options: FindOptions,
) -> Result<Response, AppError> {
    let rows = crud.find_many(filters, &options).await?;
    Ok(success_many(rows, options.limit, options.offset).into_response())
}

/// Lookup then update: two round-trips, so a concurrent delete surfaces as 404 from the store.
pub(crate) async fn update_existing(
    crud: &CrudService,
    id: &str,
    mut body: Record,
    not_found: &str,
) -> Result<Response, AppError> {
    crud.find_existing(id, not_found).await?;
    stamp_modified(&mut body);
    let row = crud.update(id, body).await?;
    Ok(success_one(row).into_response())
}

pub(crate) async fn delete_existing(crud: &CrudService, id: &str, not_found: &str) -> Result<Response, AppError> {
    crud.find_existing(id, not_found).await?;
    let row = crud.delete(id).await?;
    Ok(success_one(row).into_response())
}

/// Push an exact-match filter when the query parameter was given.
pub(crate) fn push_filter(filters: &mut Vec<(String, Value)>, column: &str, value: Option<&str>) {
    if let Some(v) = value {
        filters.push((column.to_string(), Value::String(v.to_string())));
    }
}
