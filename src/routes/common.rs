//! Operational routes: liveness, readiness against the row store, build info.

use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::time::Instant;

/// Outcome of one store round-trip, reported with its latency.
enum Readiness {
    Ready { elapsed_ms: u64 },
    Unavailable { reason: String },
}

impl IntoResponse for Readiness {
    fn into_response(self) -> Response {
        match self {
            Readiness::Ready { elapsed_ms } => (
                StatusCode::OK,
                Json(json!({"status": "ok", "store": "ok", "latency_ms": elapsed_ms})),
            )
                .into_response(),
            Readiness::Unavailable { reason } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "degraded", "store": "unavailable", "reason": reason})),
            )
                .into_response(),
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn ready(State(state): State<AppState>) -> Readiness {
    let started = Instant::now();
    match state.store.ping().await {
        Ok(()) => Readiness::Ready {
            elapsed_ms: started.elapsed().as_millis() as u64,
        },
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            Readiness::Unavailable { reason: e.to_string() }
        }
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
    }))
}

/// GET /health, GET /ready, GET /version.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
