//! HTTP接口测试
//!
//! 通过 tower 的 `oneshot` 直接驱动路由，不绑定端口

#[path = "../common/mod.rs"]
mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{build_engine, setup_logging, CountingStore, FailingCacheBackend};
use oxrecord::backend::{CacheBackend, MemoryBackend};
use oxrecord::config::WarmupConfig;
use oxrecord::http::{router, AppState};
use oxrecord::store::RecordStore;
use oxrecord::{PoolSet, Record, WarmupManager};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn app_with(store: Arc<dyn RecordStore>, backend: Arc<dyn CacheBackend>) -> Router {
    setup_logging();
    let engine = build_engine(store, backend, PoolSet::default());
    router(AppState {
        engine: Arc::new(engine),
        warmup: Arc::new(WarmupManager::new(WarmupConfig::default())),
        request_timeout: Duration::from_secs(5),
        shutdown: CancellationToken::new(),
    })
}

fn app() -> Router {
    app_with(
        Arc::new(CountingStore::default()),
        Arc::new(MemoryBackend::new()),
    )
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(text) => {
            builder = builder.header("content-type", "application/json");
            Body::from(text.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_record_lifecycle_over_http() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/record", Some(r#"{"id":"u1","name":"Ada"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "id": "1" }));

    let (status, body) = send(&app, Method::GET, "/record/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": "u1", "name": "Ada" }));

    // 请求体中的 id 被忽略，以路径为准
    let (status, body) = send(
        &app,
        Method::PUT,
        "/record/u1",
        Some(r#"{"id":"other","name":"Ada L."}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let (_, body) = send(&app, Method::GET, "/record/u1", None).await;
    assert_eq!(body["name"], "Ada L.");

    let (status, body) = send(&app, Method::GET, "/records", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": "u1", "name": "Ada L." }]));

    let (status, _) = send(&app, Method::DELETE, "/record/u1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/record/u1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "record not found" }));

    let (status, body) = send(&app, Method::GET, "/records", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_bad_requests() {
    let app = app();

    let cases = [
        (Method::POST, "/record", "not json"),
        (Method::POST, "/record", r#"{"id":"u1"}"#),
        (Method::POST, "/record", r#"{"name":"Ada"}"#),
        (Method::PUT, "/record/u1", r#"{"name":""}"#),
        (Method::PUT, "/record/u1", "{"),
    ];
    for (method, uri, body) in cases {
        let (status, value) = send(&app, method, uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", uri, body);
        assert_eq!(value, json!({ "error": "invalid request" }));
    }
}

#[tokio::test]
async fn test_not_found_on_update_and_delete() {
    let app = app();

    let (status, _) = send(&app, Method::PUT, "/record/ghost", Some(r#"{"name":"x"}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/record/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_create_is_internal_error_without_driver_text() {
    let app = app();

    send(&app, Method::POST, "/record", Some(r#"{"id":"u1","name":"Ada"}"#)).await;
    let (status, body) = send(&app, Method::POST, "/record", Some(r#"{"id":"u1","name":"Eve"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "internal error" }));
}

#[tokio::test]
async fn test_requests_succeed_with_cache_down() {
    let store = Arc::new(CountingStore::new(vec![Record::new("u1", "Ada")]));
    let app = app_with(store, Arc::new(FailingCacheBackend::default()));

    let (status, body) = send(&app, Method::GET, "/record/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ada");

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["cache"], false);
    assert_eq!(body["store"], true);
    assert_eq!(body["warmup"]["state"], "pending");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = app();

    send(&app, Method::POST, "/record", Some(r#"{"id":"u1","name":"Ada"}"#)).await;
    send(&app, Method::GET, "/record/u1", None).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("oxrecord_operations_total{op=\"read_one\",result=\"cache_hit\"} 1"));
    assert!(text.contains("oxrecord_pool_allocated_total{pool=\"record\"}"));
}
