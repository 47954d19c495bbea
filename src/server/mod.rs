//! JSON-over-HTTP API.
//!
//! Each submodule handles the endpoints of one product area.

pub mod error;
pub mod health;
pub mod optimize;
pub mod report;
pub mod search;
pub mod write;

use crate::app::Analyzer;
use crate::utils::error::{LensError, Result};
use axum::{
    routing::{get, post},
    Json, Router,
};
use error::ApiResult;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

/// Wrap a response body as `{ "success": true, ...fields }`.
pub(crate) fn success<T: Serialize>(value: T) -> ApiResult<Json<Value>> {
    let value = serde_json::to_value(value).map_err(LensError::from)?;
    let body = match value {
        Value::Object(mut map) => {
            map.insert("success".to_string(), Value::Bool(true));
            Value::Object(map)
        }
        other => serde_json::json!({ "success": true, "data": other }),
    };
    Ok(Json(body))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // GSC 數據
        .route("/api/search/list", post(search::list_pages))
        .route("/api/search/by-url", post(search::by_url))
        .route("/api/search/sql", post(search::preview_sql))
        // LLM 分析
        .route("/api/optimize/analyze", post(optimize::analyze))
        .route("/api/optimize/batch", post(optimize::batch))
        // 報告
        .route("/api/report/outline", post(report::outline))
        .route("/api/report/email", post(report::email))
        .route("/api/report/export", post(report::export))
        // 寫作輔助
        .route("/api/write/context-vectors", post(write::context_vectors))
        .route("/api/write/paragraphs", post(write::paragraphs))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 RepostLens listening on http://{}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
