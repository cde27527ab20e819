//! Resource routes. Every resource lives on one path; `?id=` selects the record for
//! single reads, updates and deletes.

use crate::handlers::{categories, corrective_actions, examples, reports, summary};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/example",
            get(examples::list)
                .post(examples::create)
                .put(examples::update)
                .delete(examples::delete),
        )
        .route(
            "/nonconformance-categories",
            get(categories::list)
                .post(categories::create)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route(
            "/nonconformance-reports",
            get(reports::list)
                .post(reports::create)
                .put(reports::update)
                .delete(reports::delete),
        )
        .route(
            "/corrective-actions",
            get(corrective_actions::list)
                .post(corrective_actions::create)
                .put(corrective_actions::update)
                .delete(corrective_actions::delete),
        )
        .route("/quality-summary", get(summary::show))
        .with_state(state)
}
