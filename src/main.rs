//! Server binary: reads settings from the environment, opens the configured row store and
//! serves the common and resource routes.

use quality_dashboard::{
    app, apply_migrations, AppState, MemoryStore, PgRowStore, PostgrestStore, RowStore, Settings,
    StoreBackend,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quality_dashboard=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::from_env()?;
    let store = open_store(&settings.backend).await?;
    let state = AppState::new(store);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state, settings.max_body_bytes)).await?;
    Ok(())
}

async fn open_store(backend: &StoreBackend) -> Result<Arc<dyn RowStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn RowStore> = match backend {
        StoreBackend::Postgrest { url, api_key } => {
            tracing::info!(url = %url, "using PostgREST store");
            Arc::new(PostgrestStore::new(url, api_key.clone())?)
        }
        StoreBackend::Postgres {
            database_url,
            max_connections,
            auto_migrate,
        } => {
            let store = PgRowStore::connect(database_url, *max_connections).await?;
            if *auto_migrate {
                apply_migrations(store.pool()).await?;
            }
            tracing::info!("using PostgreSQL store");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("no store configured; rows live in memory and vanish on exit");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}
