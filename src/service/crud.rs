//! CrudService: the row accessor bound to one table.

use crate::config::{TableDef, CREATE_TIME_COLUMN};
use crate::error::{AppError, StoreError};
use crate::store::{FindOptions, Record, RowStore};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct CrudService {
    store: Arc<dyn RowStore>,
    table: &'static TableDef,
}

impl CrudService {
    pub fn new(store: Arc<dyn RowStore>, table: &'static TableDef) -> Self {
        CrudService { store, table }
    }

    /// Exact-match filters on known columns; unknown filter keys are dropped.
    pub async fn find_many(
        &self,
        filters: &[(String, Value)],
        options: &FindOptions,
    ) -> Result<Vec<Record>, AppError> {
        let filters: Vec<(String, Value)> = filters
            .iter()
            .filter(|(col, _)| self.table.has_column(col))
            .cloned()
            .collect();
        tracing::debug!(
            table = self.table.name,
            filters = ?filters,
            limit = options.limit,
            offset = options.offset,
            "find_many"
        );
        Ok(self.store.find_many(self.table, &filters, options).await?)
    }

    /// An id the table's key type cannot hold finds nothing, whatever the backend.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Record>, AppError> {
        if !self.table.accepts_id(id) {
            return Ok(None);
        }
        Ok(self.store.find_by_id(self.table, id).await?)
    }

    /// Look the row up or fail with `NotFound(message)`.
    pub async fn find_existing(&self, id: &str, not_found: &str) -> Result<Record, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(not_found.to_string()))
    }

    /// Insert known columns only. The id is always assigned by the store.
    pub async fn create(&self, mut fields: Record) -> Result<Record, AppError> {
        self.table.retain_known(&mut fields);
        fields.remove(self.table.pk);
        let row = self.store.create(self.table, &fields).await?;
        tracing::info!(table = self.table.name, id = %row_id(&row), "created");
        Ok(row)
    }

    /// Update known columns; id and creation time are never rewritten.
    pub async fn update(&self, id: &str, mut fields: Record) -> Result<Record, AppError> {
        self.check_id(id)?;
        self.table.retain_known(&mut fields);
        fields.remove(self.table.pk);
        fields.remove(CREATE_TIME_COLUMN);
        let row = self.store.update(self.table, id, &fields).await?;
        tracing::info!(table = self.table.name, id = %id, "updated");
        Ok(row)
    }

    pub async fn delete(&self, id: &str) -> Result<Record, AppError> {
        self.check_id(id)?;
        let row = self.store.delete(self.table, id).await?;
        tracing::info!(table = self.table.name, id = %id, "deleted");
        Ok(row)
    }

    fn check_id(&self, id: &str) -> Result<(), AppError> {
        if self.table.accepts_id(id) {
            return Ok(());
        }
        Err(StoreError::RowMissing {
            table: self.table.name,
            id: id.to_string(),
        }
        .into())
    }
}

fn row_id(row: &Record) -> String {
    row.get("id").map(crate::store::scalar_text).unwrap_or_default()
}
