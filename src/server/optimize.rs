use crate::app::requests::{AnalyzeRequest, BatchAnalyzeRequest};
use crate::server::error::{ApiJson, ApiResult};
use crate::server::{success, AppState};
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn analyze(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> ApiResult<Json<Value>> {
    let response = state.analyzer.analyze(&request).await?;
    success(response)
}

pub async fn batch(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BatchAnalyzeRequest>,
) -> ApiResult<Json<Value>> {
    let results = state.analyzer.analyze_batch(&request).await?;
    let failed = results.iter().filter(|r| !r.success).count();
    tracing::info!("Batch analyzed {} pages, {} failed", results.len(), failed);
    success(json!({ "results": results }))
}
