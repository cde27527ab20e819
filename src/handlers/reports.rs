//! `/nonconformance-reports`: quality incidents with generated report numbers.

use super::common::{delete_existing, list_page, push_filter, read_one, update_existing};
use crate::config::NONCONFORMANCE_REPORTS;
use crate::error::AppError;
use crate::extractors::{JsonBody, QueryParams};
use crate::response::created_one;
use crate::service::{coerce_fields, generate_report_number, is_blank, Coercion, RequestValidator};
use crate::state::AppState;
use crate::store::{OrderBy, Record};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::Value;

pub const NOT_FOUND: &str = "Nonconformance report not found";

pub const SEVERITY_LEVELS: &[&str] = &["low", "medium", "high", "critical"];
pub const REPORT_STATUSES: &[&str] = &["open", "in_progress", "pending_approval", "closed", "cancelled"];
pub const DEFAULT_PRIORITY_SCORE: i64 = 5;

const REQUIRED: &[&str] = &[
    "title",
    "description",
    "date_occurred",
    "reported_by_user_id",
    "severity_level",
    "category",
];

const COERCIONS: &[(&str, Coercion)] = &[
    ("reported_by_user_id", Coercion::Int),
    ("priority_score", Coercion::Int),
    ("customer_notified", Coercion::Bool),
    ("estimated_cost", Coercion::Float),
];

fn check_enums(body: &Record) -> Result<(), AppError> {
    RequestValidator::one_of(body, "severity_level", SEVERITY_LEVELS)?;
    RequestValidator::one_of(body, "status", REPORT_STATUSES)
}

pub async fn list(State(state): State<AppState>, params: QueryParams) -> Result<Response, AppError> {
    let crud = state.crud(&NONCONFORMANCE_REPORTS);
    if let Some(id) = params.id.as_deref() {
        return read_one(&crud, id, NOT_FOUND).await;
    }
    let mut filters = Vec::new();
    push_filter(&mut filters, "status", params.get("status"));
    push_filter(&mut filters, "severity_level", params.get("severity"));
    push_filter(&mut filters, "category", params.get("category"));
    let options = params.find_options().order_by(OrderBy::desc("date_occurred"));
    list_page(&crud, &filters, options).await
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(mut body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    RequestValidator::require(&body, REQUIRED)?;
    check_enums(&body)?;
    if is_blank(body.get("report_number")) {
        body.insert("report_number".into(), Value::String(generate_report_number()));
    }
    if is_blank(body.get("priority_score")) {
        body.insert("priority_score".into(), Value::from(DEFAULT_PRIORITY_SCORE));
    }
    if body.get("customer_notified").map(Value::is_null).unwrap_or(true) {
        body.insert("customer_notified".into(), Value::Bool(false));
    }
    if !body.contains_key("estimated_cost") {
        body.insert("estimated_cost".into(), Value::Null);
    }
    coerce_fields(&mut body, COERCIONS)?;
    let row = state.crud(&NONCONFORMANCE_REPORTS).create(body).await?;
    Ok(created_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    params: QueryParams,
    JsonBody(mut body): JsonBody,
) -> Result<Response, AppError> {
    let id = params.require_id()?;
    check_enums(&body)?;
    coerce_fields(&mut body, COERCIONS)?;
    update_existing(&state.crud(&NONCONFORMANCE_REPORTS), id, body, NOT_FOUND).await
}

pub async fn delete(State(state): State<AppState>, params: QueryParams) -> Result<Response, AppError> {
    let id = params.require_id()?;
    delete_existing(&state.crud(&NONCONFORMANCE_REPORTS), id, NOT_FOUND).await
}
