//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! HTTP接口模块
//!
//! 把记录的增删改查、健康检查和指标暴露为JSON接口

pub mod error;

use crate::error::Result;
use crate::model::{NameUpdate, Record};
use crate::sync::{RequestContext, SyncEngine, WarmupManager};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub warmup: Arc<WarmupManager>,
    /// 单个请求的截止时间，0 表示不限制
    pub request_timeout: Duration,
    /// 服务级取消令牌，每个请求持有它的子令牌
    pub shutdown: CancellationToken,
}

impl AppState {
    fn context(&self) -> RequestContext {
        RequestContext::with_token(self.shutdown.child_token()).timeout(self.request_timeout)
    }
}

type ApiResult = std::result::Result<Response, ApiError>;

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/record", post(create_record))
        .route(
            "/record/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/records", get(list_records))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 在给定地址上提供服务，直到服务级令牌被取消
pub async fn serve(state: AppState, bind_addr: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn create_record(
    State(state): State<AppState>,
    body: std::result::Result<Json<Record>, JsonRejection>,
) -> ApiResult {
    let Json(record) = body?;
    let store_id = state.engine.create(&state.context(), &record).await?;
    Ok(Json(json!({ "status": "ok", "id": store_id })).into_response())
}

async fn get_record(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let record = state.engine.read_one(&state.context(), &id).await?;
    Ok(Json(&*record).into_response())
}

async fn list_records(State(state): State<AppState>) -> ApiResult {
    let records = state.engine.read_all(&state.context()).await?;
    Ok(Json(&*records).into_response())
}

async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<NameUpdate>, JsonRejection>,
) -> ApiResult {
    let Json(update) = body?;
    state
        .engine
        .update(&state.context(), &id, &update.name)
        .await?;
    Ok(Json(json!({ "status": "ok" })).into_response())
}

async fn delete_record(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.engine.delete(&state.context(), &id).await?;
    Ok(Json(json!({ "status": "ok" })).into_response())
}

async fn health(State(state): State<AppState>) -> Response {
    let (cache_ok, store_ok) = state.engine.health().await;
    let status = if cache_ok && store_ok { "ok" } else { "degraded" };
    let warmup = state.warmup.status().await;
    Json(json!({
        "status": status,
        "cache": cache_ok,
        "store": store_ok,
        "warmup": warmup,
    }))
    .into_response()
}

async fn metrics(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.engine.render_metrics(),
    )
        .into_response()
}
