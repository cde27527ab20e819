//! `/example`: the starter resource, a named record with free-text search by name.

use super::common::{delete_existing, list_page, push_filter, read_one, update_existing};
use crate::config::EXAMPLES;
use crate::error::AppError;
use crate::extractors::{JsonBody, QueryParams};
use crate::response::created_one;
use crate::service::RequestValidator;
use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

const NOT_FOUND: &str = "Record not found";

pub async fn list(State(state): State<AppState>, params: QueryParams) -> Result<Response, AppError> {
    let crud = state.crud(&EXAMPLES);
    if let Some(id) = params.id.as_deref() {
        return read_one(&crud, id, NOT_FOUND).await;
    }
    let mut filters = Vec::new();
    // exact match only: the store has no pattern predicates
    push_filter(&mut filters, "name", params.search.as_deref());
    list_page(&crud, &filters, params.find_options()).await
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    RequestValidator::require(&body, &["name"])?;
    let row = state.crud(&EXAMPLES).create(body).await?;
    Ok(created_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    params: QueryParams,
    JsonBody(body): JsonBody,
) -> Result<Response, AppError> {
    let id = params.require_id()?;
    update_existing(&state.crud(&EXAMPLES), id, body, NOT_FOUND).await
}

pub async fn delete(State(state): State<AppState>, params: QueryParams) -> Result<Response, AppError> {
    let id = params.require_id()?;
    delete_existing(&state.crud(&EXAMPLES), id, NOT_FOUND).await
}
