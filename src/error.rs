//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures raised by a [`crate::store::RowStore`] backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The row addressed by an update or delete was gone when the write ran.
    #[error("no row in {table} with id {id}")]
    RowMissing { table: &'static str, id: String },
    /// A write left a NOT NULL column empty.
    #[error("{column} must not be null")]
    NullColumn { table: &'static str, column: &'static str },
    /// A unique or referential constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    /// PostgREST answered with a non-success status.
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("backing store unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decode: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub status: u16,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::Store(e) => store_status(e),
        }
    }
}

fn store_status(e: &StoreError) -> (StatusCode, &'static str) {
    match e {
        StoreError::RowMissing { .. } => (StatusCode::NOT_FOUND, "not_found"),
        StoreError::NullColumn { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
        StoreError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        StoreError::Db(sqlx::Error::RowNotFound) => (StatusCode::NOT_FOUND, "not_found"),
        StoreError::Db(sqlx::Error::Database(db)) => {
            let code = db.code();
            match code.as_deref() {
                // unique_violation, foreign_key_violation
                Some("23505") | Some("23503") => (StatusCode::CONFLICT, "conflict"),
                // not_null_violation
                Some("23502") => (StatusCode::BAD_REQUEST, "validation_error"),
                // class 22: data exception (bad date, out of range, invalid text representation)
                Some(c) if c.starts_with("22") => (StatusCode::BAD_REQUEST, "bad_request"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            }
        }
        StoreError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
        StoreError::Upstream { status, .. } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            "upstream_error",
        ),
        StoreError::Transport(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
        StoreError::Decode(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                status: status.as_u16(),
            },
        };
        (status, Json(body)).into_response()
    }
}
