use crate::app::requests::{ContextVectorRequest, ParagraphReviewRequest};
use crate::server::error::{ApiJson, ApiResult};
use crate::server::{success, AppState};
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn context_vectors(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ContextVectorRequest>,
) -> ApiResult<Json<Value>> {
    let response = state.analyzer.context_vectors(&request).await?;
    success(response)
}

pub async fn paragraphs(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ParagraphReviewRequest>,
) -> ApiResult<Json<Value>> {
    let results = state.analyzer.review_paragraphs(&request).await?;
    success(json!({ "results": results }))
}
