//! `/nonconformance-categories`: lists only active categories; delete is a soft delete.

use super::common::{list_page, read_one, stamp_modified, update_existing};
use crate::config::NONCONFORMANCE_CATEGORIES;
use crate::error::AppError;
use crate::extractors::{JsonBody, QueryParams};
use crate::response::{created_one, success_one};
use crate::service::{coerce_fields, Coercion, RequestValidator};
use crate::state::AppState;
use crate::store::{OrderBy, Record};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::Value;

const NOT_FOUND: &str = "Category not found";
const COERCIONS: &[(&str, Coercion)] = &[("is_active", Coercion::Bool)];

pub async fn list(State(state): State<AppState>, params: QueryParams) -> Result<Response, AppError> {
    let crud = state.crud(&NONCONFORMANCE_CATEGORIES);
    if let Some(id) = params.id.as_deref() {
        return read_one(&crud, id, NOT_FOUND).await;
    }
    let filters = vec![("is_active".to_string(), Value::Bool(true))];
    let options = params.find_options().order_by(OrderBy::asc("name"));
    list_page(&crud, &filters, options).await
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(mut body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    RequestValidator::require(&body, &["name"])?;
    coerce_fields(&mut body, COERCIONS)?;
    let row = state.crud(&NONCONFORMANCE_CATEGORIES).create(body).await?;
    Ok(created_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    params: QueryParams,
    JsonBody(mut body): JsonBody,
) -> Result<Response, AppError> {
    let id = params.require_id()?;
    coerce_fields(&mut body, COERCIONS)?;
    update_existing(&state.crud(&NONCONFORMANCE_CATEGORIES), id, body, NOT_FOUND).await
}

/// Flip `is_active` off; the row stays and remains readable by id.
pub async fn delete(State(state): State<AppState>, params: QueryParams) -> Result<Response, AppError> {
    let id = params.require_id()?;
    let crud = state.crud(&NONCONFORMANCE_CATEGORIES);
    crud.find_existing(id, NOT_FOUND).await?;
    let mut body = Record::new();
    body.insert("is_active".to_string(), Value::Bool(false));
    stamp_modified(&mut body);
    let row = crud.update(id, body).await?;
    Ok(success_one(row).into_response())
}
