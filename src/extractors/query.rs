//! Query-string parameters shared by every resource route.

use crate::error::AppError;
use crate::store::FindOptions;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use std::collections::HashMap;

/// `limit`, `offset`, `id` and `search` parsed up front; everything else stays available
/// as raw strings for table-specific filters.
#[derive(Clone, Debug, Default)]
pub struct QueryParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub id: Option<String>,
    pub search: Option<String>,
    raw: HashMap<String, String>,
}

impl QueryParams {
    pub fn parse(raw: HashMap<String, String>) -> Result<Self, AppError> {
        let mut params = QueryParams {
            raw,
            ..Default::default()
        };
        params.limit = params.parse_u32("limit")?;
        params.offset = params.parse_u32("offset")?;
        params.id = params.get("id").map(String::from);
        params.search = params.get("search").map(String::from);
        Ok(params)
    }

    fn parse_u32(&self, key: &str) -> Result<Option<u32>, AppError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| AppError::Validation(format!("{} must be a non-negative integer", key))),
        }
    }

    /// Trimmed, non-empty value of a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    pub fn require_id(&self) -> Result<&str, AppError> {
        self.id
            .as_deref()
            .ok_or_else(|| AppError::Validation("id parameter is required".into()))
    }

    pub fn find_options(&self) -> FindOptions {
        FindOptions::new(self.limit, self.offset)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        QueryParams::parse(raw)
    }
}
