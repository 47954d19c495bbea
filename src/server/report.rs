use crate::app::requests::{EmailRequest, ExportRequest, OutlineRequest};
use crate::server::error::{ApiJson, ApiResult};
use crate::server::{success, AppState};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

pub const EXPORT_FILENAME: &str = "repostlens_report.zip";

pub async fn outline(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OutlineRequest>,
) -> ApiResult<Json<Value>> {
    let response = state.analyzer.outline(&request).await?;
    success(response)
}

pub async fn email(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EmailRequest>,
) -> ApiResult<Json<Value>> {
    let draft = state.analyzer.email(&request).await?;
    success(draft)
}

pub async fn export(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ExportRequest>,
) -> ApiResult<Response> {
    let bytes = state.analyzer.export(&request)?;
    tracing::info!("Exported report for {} ({} bytes)", request.page, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        bytes,
    )
        .into_response())
}
