//! `/quality-summary`: dashboard counts over all nonconformance reports.

use crate::config::NONCONFORMANCE_REPORTS;
use crate::error::AppError;
use crate::response::success_one;
use crate::service::quality_summary;
use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

pub async fn show(State(state): State<AppState>) -> Result<Response, AppError> {
    let summary = quality_summary(&state.crud(&NONCONFORMANCE_REPORTS)).await?;
    Ok(success_one(summary).into_response())
}
