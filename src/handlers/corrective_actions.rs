//! `/corrective-actions`: remediation tasks, each tied to a nonconformance report.

use super::common::{delete_existing, list_page, push_filter, read_one, stamp_modified};
use super::reports;
use crate::config::{CORRECTIVE_ACTIONS, NONCONFORMANCE_REPORTS};
use crate::error::AppError;
use crate::extractors::{JsonBody, QueryParams};
use crate::response::{created_one, success_one};
use crate::service::{coerce_fields, Coercion, RequestValidator};
use crate::state::AppState;
use crate::store::{scalar_text, OrderBy, Record};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

const NOT_FOUND: &str = "Corrective action not found";
const REQUIRED: &[&str] = &["nonconformance_report_id", "action_description", "action_type"];
const COERCIONS: &[(&str, Coercion)] = &[("nonconformance_report_id", Coercion::Int)];

/// The referenced report must exist when the body names one. Not transactional.
async fn check_report_exists(state: &AppState, body: &Record) -> Result<(), AppError> {
    let Some(report_id) = body.get("nonconformance_report_id").filter(|v| !v.is_null()) else {
        return Ok(());
    };
    state
        .crud(&NONCONFORMANCE_REPORTS)
        .find_existing(&scalar_text(report_id), reports::NOT_FOUND)
        .await
        .map(|_| ())
}

pub async fn list(State(state): State<AppState>, params: QueryParams) -> Result<Response, AppError> {
    let crud = state.crud(&CORRECTIVE_ACTIONS);
    if let Some(id) = params.id.as_deref() {
        return read_one(&crud, id, NOT_FOUND).await;
    }
    let mut filters = Vec::new();
    push_filter(&mut filters, "nonconformance_report_id", params.get("nonconformance_report_id"));
    push_filter(&mut filters, "status", params.get("status"));
    let options = params.find_options().order_by(OrderBy::asc("target_completion_date"));
    list_page(&crud, &filters, options).await
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(mut body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    RequestValidator::require(&body, REQUIRED)?;
    coerce_fields(&mut body, COERCIONS)?;
    check_report_exists(&state, &body).await?;
    let row = state.crud(&CORRECTIVE_ACTIONS).create(body).await?;
    Ok(created_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    params: QueryParams,
    JsonBody(mut body): JsonBody,
) -> Result<Response, AppError> {
    let id = params.require_id()?;
    coerce_fields(&mut body, COERCIONS)?;
    let crud = state.crud(&CORRECTIVE_ACTIONS);
    crud.find_existing(id, NOT_FOUND).await?;
    check_report_exists(&state, &body).await?;
    stamp_modified(&mut body);
    let row = crud.update(id, body).await?;
    Ok(success_one(row).into_response())
}

pub async fn delete(State(state): State<AppState>, params: QueryParams) -> Result<Response, AppError> {
    let id = params.require_id()?;
    delete_existing(&state.crud(&CORRECTIVE_ACTIONS), id, NOT_FOUND).await
}
