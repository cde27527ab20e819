//! Router-level tests over the in-memory store.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use async_trait::async_trait;
use quality_dashboard::store::{FindOptions, Record};
use quality_dashboard::{app, AppState, MemoryStore, RowStore, StoreError, TableDef};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const BODY_LIMIT: usize = 64 * 1024;

fn router() -> Router {
    app(AppState::new(Arc::new(MemoryStore::new())), BODY_LIMIT)
}

/// Memory-backed store that behaves like PostgREST on ids the key type cannot parse
/// (400 from the backend) and counts single-row lookups.
#[derive(Default)]
struct StrictStore {
    inner: MemoryStore,
    lookups: AtomicUsize,
}

fn reject_bad_id(id: &str) -> Result<(), StoreError> {
    match id.trim().parse::<i64>() {
        Ok(_) => Ok(()),
        Err(_) => Err(StoreError::Upstream {
            status: 400,
            message: format!("invalid input syntax for type bigint: \"{id}\""),
        }),
    }
}

#[async_trait]
impl RowStore for StrictStore {
    async fn find_many(
        &self,
        table: &TableDef,
        filters: &[(String, Value)],
        options: &FindOptions,
    ) -> Result<Vec<Record>, StoreError> {
        self.inner.find_many(table, filters, options).await
    }
    async fn find_by_id(&self, table: &TableDef, id: &str) -> Result<Option<Record>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        reject_bad_id(id)?;
        self.inner.find_by_id(table, id).await
    }
    async fn create(&self, table: &TableDef, fields: &Record) -> Result<Record, StoreError> {
        self.inner.create(table, fields).await
    }
    async fn update(&self, table: &TableDef, id: &str, fields: &Record) -> Result<Record, StoreError> {
        reject_bad_id(id)?;
        self.inner.update(table, id, fields).await
    }
    async fn delete(&self, table: &TableDef, id: &str) -> Result<Record, StoreError> {
        reject_bad_id(id)?;
        self.inner.delete(table, id).await
    }
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn strict_router() -> (Router, Arc<StrictStore>) {
    let store = Arc::new(StrictStore::default());
    (app(AppState::new(store.clone()), BODY_LIMIT), store)
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn report_body() -> Value {
    json!({
        "title": "Burr on flange",
        "description": "Sharp edge on outer flange",
        "date_occurred": "2024-03-01",
        "reported_by_user_id": "7",
        "severity_level": "high",
        "category": "Machining"
    })
}

async fn create_report(router: &Router, body: Value) -> Value {
    let (status, created) = call(router, "POST", "/api/nonconformance-reports", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created["data"].clone()
}

#[tokio::test]
async fn health_and_ready() {
    let router = router();
    let (status, body) = call(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, body) = call(&router, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "ok");
}

#[tokio::test]
async fn example_crud_lifecycle() {
    let router = router();
    let (status, created) = call(&router, "POST", "/api/example", Some(json!({"name": "first"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, one) = call(&router, "GET", &format!("/api/example?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["data"]["name"], "first");

    let (status, updated) = call(
        &router,
        "PUT",
        &format!("/api/example?id={id}"),
        Some(json!({"name": "renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["name"], "renamed");
    assert!(updated["data"]["modify_time"].is_string());

    let (status, deleted) = call(&router, "DELETE", &format!("/api/example?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["data"]["id"], id);

    let (status, gone) = call(&router, "GET", &format!("/api/example?id={id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(gone["error"]["message"], "Record not found");
}

#[tokio::test]
async fn missing_required_field_is_named() {
    let router = router();
    let mut body = report_body();
    body["title"] = json!("   ");
    let (status, err) = call(&router, "POST", "/api/nonconformance-reports", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["message"], "title is required");
    assert_eq!(err["error"]["status"], 400);

    let (status, err) = call(&router, "POST", "/api/corrective-actions", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["message"], "nonconformance_report_id is required");
}

#[tokio::test]
async fn report_create_fills_defaults_and_coerces() {
    let router = router();
    let report = create_report(&router, report_body()).await;
    let number = report["report_number"].as_str().unwrap();
    assert!(regex::Regex::new(r"^NCR-\d{14}-\d{3}$").unwrap().is_match(number), "{number}");
    assert_eq!(report["reported_by_user_id"], 7);
    assert_eq!(report["priority_score"], 5);
    assert_eq!(report["customer_notified"], false);
    assert_eq!(report["estimated_cost"], Value::Null);
    assert_eq!(report["status"], "open");

    let mut body = report_body();
    body["report_number"] = json!("NCR-CUSTOM");
    body["priority_score"] = json!("9");
    body["customer_notified"] = json!("true");
    body["estimated_cost"] = json!("120.50");
    let report = create_report(&router, body).await;
    assert_eq!(report["report_number"], "NCR-CUSTOM");
    assert_eq!(report["priority_score"], 9);
    assert_eq!(report["customer_notified"], true);
    assert_eq!(report["estimated_cost"], 120.5);
}

#[tokio::test]
async fn report_enums_and_numbers_are_checked() {
    let router = router();
    let mut body = report_body();
    body["severity_level"] = json!("urgent");
    let (status, err) = call(&router, "POST", "/api/nonconformance-reports", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"]["message"].as_str().unwrap().starts_with("severity_level must be one of"));

    let mut body = report_body();
    body["reported_by_user_id"] = json!("seven");
    let (status, err) = call(&router, "POST", "/api/nonconformance-reports", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["message"], "reported_by_user_id must be an integer");
}

#[tokio::test]
async fn report_list_filters_and_orders_by_date_desc() {
    let router = router();
    for (date, severity) in [("2024-01-10", "low"), ("2024-03-05", "critical"), ("2024-02-20", "low")] {
        let mut body = report_body();
        body["date_occurred"] = json!(date);
        body["severity_level"] = json!(severity);
        body["report_number"] = json!(format!("NCR-{date}"));
        create_report(&router, body).await;
    }
    let (status, list) = call(&router, "GET", "/api/nonconformance-reports", None).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["date_occurred"].as_str().unwrap())
        .collect();
    assert_eq!(dates, ["2024-03-05", "2024-02-20", "2024-01-10"]);

    let (_, low) = call(&router, "GET", "/api/nonconformance-reports?severity=low", None).await;
    assert_eq!(low["meta"]["count"], 2);

    let (_, summary) = call(&router, "GET", "/api/quality-summary", None).await;
    assert_eq!(summary["data"]["total_reports"], 3);
    assert_eq!(summary["data"]["open_reports"], 3);
    assert_eq!(summary["data"]["critical_issues"], 1);
    assert_eq!(summary["data"]["by_severity"]["low"], 2);
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found_everywhere() {
    let router = router();
    let cases = [
        ("/api/example", "Record not found"),
        ("/api/nonconformance-categories", "Category not found"),
        ("/api/nonconformance-reports", "Nonconformance report not found"),
        ("/api/corrective-actions", "Corrective action not found"),
    ];
    for (path, message) in cases {
        let (status, err) = call(&router, "PUT", &format!("{path}?id=999"), Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(err["error"]["message"], message, "{path}");
        assert_eq!(err["error"]["code"], "not_found");

        let (status, _) = call(&router, "DELETE", &format!("{path}?id=999"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn malformed_ids_are_not_found_on_any_backend() {
    let (router, store) = strict_router();
    for (path, message) in [
        ("/api/example", "Record not found"),
        ("/api/nonconformance-categories", "Category not found"),
        ("/api/nonconformance-reports", "Nonconformance report not found"),
        ("/api/corrective-actions", "Corrective action not found"),
    ] {
        let (status, err) = call(&router, "PUT", &format!("{path}?id=abc"), Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(err["error"]["message"], message, "{path}");

        let (status, _) = call(&router, "DELETE", &format!("{path}?id=abc"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        let (status, _) = call(&router, "GET", &format!("{path}?id=abc"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
    }
    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn required_columns_cannot_be_nulled_by_update() {
    let router = router();
    let report = create_report(&router, report_body()).await;
    let uri = format!("/api/nonconformance-reports?id={}", report["id"]);
    let (status, err) = call(&router, "PUT", &uri, Some(json!({"title": null, "priority_score": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "validation_error");
    assert_eq!(err["error"]["message"], "title must not be null");

    let (_, still) = call(&router, "GET", &uri, None).await;
    assert_eq!(still["data"]["title"], "Burr on flange");
    assert_eq!(still["data"]["priority_score"], 5);
}

#[tokio::test]
async fn corrective_action_update_looks_rows_up_once() {
    let (router, store) = strict_router();
    let report = create_report(&router, report_body()).await;
    let action = json!({
        "nonconformance_report_id": report["id"],
        "action_description": "Deburr all flanges",
        "action_type": "corrective"
    });
    let (_, created) = call(&router, "POST", "/api/corrective-actions", Some(action)).await;
    let uri = format!("/api/corrective-actions?id={}", created["data"]["id"]);

    let before = store.lookups.load(Ordering::SeqCst);
    let (status, updated) = call(&router, "PUT", &uri, Some(json!({"status": "in_progress"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["status"], "in_progress");
    assert_eq!(store.lookups.load(Ordering::SeqCst) - before, 1);

    let before = store.lookups.load(Ordering::SeqCst);
    let (status, err) = call(&router, "PUT", &uri, Some(json!({"nonconformance_report_id": 77}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["message"], "Nonconformance report not found");
    assert_eq!(store.lookups.load(Ordering::SeqCst) - before, 2);
}

#[tokio::test]
async fn writes_without_id_are_rejected() {
    let router = router();
    for path in [
        "/api/example",
        "/api/nonconformance-categories",
        "/api/nonconformance-reports",
        "/api/corrective-actions",
    ] {
        let (status, err) = call(&router, "PUT", path, Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(err["error"]["message"], "id parameter is required");
        let (status, _) = call(&router, "DELETE", path, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
    }
}

#[tokio::test]
async fn category_delete_is_soft() {
    let router = router();
    let (_, a) = call(&router, "POST", "/api/nonconformance-categories", Some(json!({"name": "Welding"}))).await;
    let (_, b) = call(&router, "POST", "/api/nonconformance-categories", Some(json!({"name": "Assembly"}))).await;
    assert_eq!(a["data"]["is_active"], true);
    let id = a["data"]["id"].as_i64().unwrap();

    let (_, list) = call(&router, "GET", "/api/nonconformance-categories", None).await;
    let names: Vec<&str> = list["data"].as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Assembly", "Welding"]);

    let (status, deleted) = call(&router, "DELETE", &format!("/api/nonconformance-categories?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["data"]["is_active"], false);

    let (_, list) = call(&router, "GET", "/api/nonconformance-categories", None).await;
    assert_eq!(list["meta"]["count"], 1);
    assert_eq!(list["data"][0]["id"], b["data"]["id"]);

    let (status, still) = call(&router, "GET", &format!("/api/nonconformance-categories?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(still["data"]["is_active"], false);
}

#[tokio::test]
async fn corrective_action_requires_existing_report() {
    let router = router();
    let body = json!({
        "nonconformance_report_id": 42,
        "action_description": "Deburr all flanges",
        "action_type": "corrective"
    });
    let (status, err) = call(&router, "POST", "/api/corrective-actions", Some(body.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["message"], "Nonconformance report not found");

    let report = create_report(&router, report_body()).await;
    let mut body = body;
    body["nonconformance_report_id"] = json!(report["id"].to_string());
    let (status, created) = call(&router, "POST", "/api/corrective-actions", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["nonconformance_report_id"], report["id"]);
    assert_eq!(created["data"]["status"], "planned");

    let uri = format!("/api/corrective-actions?nonconformance_report_id={}", report["id"]);
    let (_, list) = call(&router, "GET", &uri, None).await;
    assert_eq!(list["meta"]["count"], 1);
}

fn ids(list: &Value) -> Vec<Value> {
    list["data"].as_array().unwrap().iter().map(|r| r["id"].clone()).collect()
}

#[tokio::test]
async fn paging_is_uniform_across_resources() {
    let router = router();
    for i in 0..5 {
        call(&router, "POST", "/api/example", Some(json!({"name": format!("e{i}")}))).await;
        call(&router, "POST", "/api/nonconformance-categories", Some(json!({"name": format!("c{}", 5 - i)}))).await;
        let mut body = report_body();
        body["date_occurred"] = json!(format!("2024-0{}-01", i + 1));
        body["report_number"] = json!(format!("NCR-P{i}"));
        let report = create_report(&router, body).await;
        let action = json!({
            "nonconformance_report_id": report["id"],
            "action_description": "Retrain operator",
            "action_type": "corrective",
            "target_completion_date": format!("2024-12-0{}", 5 - i)
        });
        let (status, _) = call(&router, "POST", "/api/corrective-actions", Some(action)).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    for path in [
        "/api/example",
        "/api/nonconformance-categories",
        "/api/nonconformance-reports",
        "/api/corrective-actions",
    ] {
        let (_, all) = call(&router, "GET", path, None).await;
        assert_eq!(all["meta"], json!({"count": 5, "limit": 100, "offset": 0}), "{path}");
        let all_ids = ids(&all);

        let (status, page) = call(&router, "GET", &format!("{path}?limit=2&offset=1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["meta"], json!({"count": 2, "limit": 2, "offset": 1}), "{path}");
        assert_eq!(ids(&page), all_ids[1..3].to_vec(), "{path}");

        let (_, tail) = call(&router, "GET", &format!("{path}?limit=10&offset=4"), None).await;
        assert_eq!(ids(&tail), all_ids[4..].to_vec(), "{path}");

        let (_, past) = call(&router, "GET", &format!("{path}?offset=9"), None).await;
        assert_eq!(past["meta"]["count"], 0, "{path}");

        let (status, err) = call(&router, "GET", &format!("{path}?limit=abc"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"]["message"], "limit must be a non-negative integer");
    }
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let router = router();
    let req = Request::builder()
        .method("POST")
        .uri("/api/example")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (status, err) = call(&crate::router(), "POST", "/api/example", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["message"], "body must be a JSON object");
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let big = "x".repeat(BODY_LIMIT + 1);
    let (status, err) = call(&router(), "POST", "/api/example", Some(json!({"name": big}))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(err["error"]["code"], "payload_too_large");
    assert_eq!(err["error"]["status"], 413);
}

#[tokio::test]
async fn body_limit_above_extractor_default_is_honoured() {
    let router = app(AppState::new(Arc::new(MemoryStore::new())), 4 * 1024 * 1024);
    let name = "n".repeat(3 * 1024 * 1024);
    let (status, created) = call(&router, "POST", "/api/example", Some(json!({"name": name}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["name"].as_str().unwrap().len(), 3 * 1024 * 1024);
}
