use crate::app::requests::{ListFormat, SearchByUrlRequest, SearchListRequest, SqlPreviewRequest};
use crate::core::render::page_summaries_csv;
use crate::server::error::{ApiJson, ApiResult};
use crate::server::{success, AppState};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// JSON by default; `"format": "csv"` downloads the rows instead.
pub async fn list_pages(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SearchListRequest>,
) -> ApiResult<Response> {
    let response = state.analyzer.list_pages(&request).await?;

    match request.format {
        ListFormat::Json => Ok(success(response)?.into_response()),
        ListFormat::Csv => {
            let csv = page_summaries_csv(&response.rows)?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (header::CONTENT_DISPOSITION, "attachment; filename=\"pages.csv\""),
                ],
                csv,
            )
                .into_response())
        }
    }
}

pub async fn by_url(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SearchByUrlRequest>,
) -> ApiResult<Json<Value>> {
    let response = state.analyzer.page_queries(&request).await?;
    success(response)
}

/// Dry run: render the SQL without sending it.
pub async fn preview_sql(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SqlPreviewRequest>,
) -> ApiResult<Json<Value>> {
    let sql = state.analyzer.sql_preview(&request)?;
    success(json!({ "sql": sql }))
}
