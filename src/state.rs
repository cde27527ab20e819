//! Shared application state for all routes: only the row store handle.

use crate::config::TableDef;
use crate::service::CrudService;
use crate::store::RowStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RowStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        AppState { store }
    }

    pub fn crud(&self, table: &'static TableDef) -> CrudService {
        CrudService::new(self.store.clone(), table)
    }
}
