//! PostgREST backend: every accessor call is one HTTP round-trip.

use super::{scalar_text, FindOptions, Record, RowStore};
use crate::config::TableDef;
use crate::error::StoreError;
use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PostgrestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(PostgrestStore {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: Method, table: &TableDef) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, table.name);
        let mut req = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .header("Prefer", "return=representation");
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }
        req
    }

    async fn rows(&self, req: RequestBuilder) -> Result<Vec<Record>, StoreError> {
        let resp = req.send().await?;
        let resp = check_status(resp).await?;
        let body: Value = resp.json().await?;
        decode_rows(body)
    }
}

/// Query pairs for a filtered, ordered, paged select.
fn list_query(table: &TableDef, filters: &[(String, Value)], options: &FindOptions) -> Vec<(String, String)> {
    let mut q = vec![("select".to_string(), "*".to_string())];
    for (col, val) in filters {
        q.push((col.clone(), format!("eq.{}", scalar_text(val))));
    }
    let order = match &options.order_by {
        Some(o) if o.column != table.pk => {
            format!("{}.{},{}.asc", o.column, o.direction.as_str(), table.pk)
        }
        Some(o) => format!("{}.{}", table.pk, o.direction.as_str()),
        None => format!("{}.asc", table.pk),
    };
    q.push(("order".to_string(), order));
    q.push(("limit".to_string(), options.limit.to_string()));
    q.push(("offset".to_string(), options.offset.to_string()));
    q
}

fn id_query(table: &TableDef, id: &str) -> Vec<(String, String)> {
    vec![(table.pk.to_string(), format!("eq.{}", id.trim()))]
}

fn missing_row(table: &TableDef, id: &str) -> StoreError {
    StoreError::RowMissing {
        table: table.name,
        id: id.to_string(),
    }
}

async fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(StoreError::Upstream {
        status: status.as_u16(),
        message: upstream_message(&text, status.as_u16()),
    })
}

/// PostgREST errors carry `{"message": ...}`; fall back to the raw body.
fn upstream_message(body: &str, status: u16) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("backing store returned status {}", status))
}

fn decode_rows(body: Value) -> Result<Vec<Record>, StoreError> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(m) => Ok(m),
                other => Err(StoreError::Decode(format!("expected row object, got {}", other))),
            })
            .collect(),
        Value::Object(m) => Ok(vec![m]),
        other => Err(StoreError::Decode(format!("expected row array, got {}", other))),
    }
}

#[async_trait]
impl RowStore for PostgrestStore {
    async fn find_many(
        &self,
        table: &TableDef,
        filters: &[(String, Value)],
        options: &FindOptions,
    ) -> Result<Vec<Record>, StoreError> {
        let query = list_query(table, filters, options);
        tracing::debug!(table = table.name, query = ?query, "postgrest select");
        self.rows(self.request(Method::GET, table).query(&query)).await
    }

    async fn find_by_id(&self, table: &TableDef, id: &str) -> Result<Option<Record>, StoreError> {
        if !table.accepts_id(id) {
            return Ok(None);
        }
        let mut query = id_query(table, id);
        query.push(("limit".to_string(), "1".to_string()));
        tracing::debug!(table = table.name, id = %id, "postgrest select by id");
        let rows = self.rows(self.request(Method::GET, table).query(&query)).await?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, table: &TableDef, fields: &Record) -> Result<Record, StoreError> {
        tracing::debug!(table = table.name, "postgrest insert");
        let rows = self.rows(self.request(Method::POST, table).json(fields)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no representation".into()))
    }

    async fn update(&self, table: &TableDef, id: &str, fields: &Record) -> Result<Record, StoreError> {
        if !table.accepts_id(id) {
            return Err(missing_row(table, id));
        }
        tracing::debug!(table = table.name, id = %id, "postgrest update");
        let req = self
            .request(Method::PATCH, table)
            .query(&id_query(table, id))
            .json(fields);
        let rows = self.rows(req).await?;
        rows.into_iter().next().ok_or_else(|| missing_row(table, id))
    }

    async fn delete(&self, table: &TableDef, id: &str) -> Result<Record, StoreError> {
        if !table.accepts_id(id) {
            return Err(missing_row(table, id));
        }
        tracing::debug!(table = table.name, id = %id, "postgrest delete");
        let req = self.request(Method::DELETE, table).query(&id_query(table, id));
        let rows = self.rows(req).await?;
        rows.into_iter().next().ok_or_else(|| missing_row(table, id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut req = self.http.get(format!("{}/", self.base_url));
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }
        check_status(req.send().await?).await?;
        Ok(())
    }
}
