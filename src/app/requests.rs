use crate::core::sql::{
    build_page_list_query, build_page_queries_query, PageListParams, PageQueriesParams,
    DEFAULT_LIST_LIMIT, DEFAULT_QUERY_LIMIT,
};
use crate::domain::model::{
    AnalysisData, BatchItem, ContextVector, KeywordSummary, OutlineSection, PageSummary, QueryMetric,
    ReportingWindow,
};
use crate::utils::error::{LensError, Result};
use crate::utils::validation::{require_text, validate_url};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Optional date range shared by the search requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowRequest {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub days: Option<u32>,
}

impl WindowRequest {
    pub fn resolve(&self, today: NaiveDate) -> Result<ReportingWindow> {
        ReportingWindow::resolve(today, self.start_date, self.end_date, self.days)
    }
}

/// GSC URL-prefix property for a page: its origin with a trailing slash.
pub fn site_from_page(page: &str) -> Result<String> {
    let url = validate_url("page", page)?;
    Ok(format!("{}/", url.origin().ascii_serialization()))
}

fn resolve_site(site: Option<&str>, page: &str) -> Result<String> {
    match site.map(str::trim).filter(|s| !s.is_empty()) {
        Some(site) => Ok(site.to_string()),
        None => site_from_page(page),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchListRequest {
    pub site: String,
    #[serde(default)]
    pub format: ListFormat,
    #[serde(flatten)]
    pub window: WindowRequest,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub min_clicks: Option<u64>,
    #[serde(default)]
    pub page_prefix: Option<String>,
}

impl SearchListRequest {
    pub fn to_params(&self, table: &str, today: NaiveDate) -> Result<PageListParams> {
        let site = require_text("site", &self.site)?;
        Ok(PageListParams {
            table: table.to_string(),
            site: site.to_string(),
            window: self.window.resolve(today)?,
            limit: self.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            min_clicks: self.min_clicks.unwrap_or(0),
            page_prefix: self.page_prefix.clone().filter(|p| !p.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchByUrlRequest {
    pub page: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(flatten)]
    pub window: WindowRequest,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchByUrlRequest {
    pub fn to_params(&self, table: &str, today: NaiveDate) -> Result<PageQueriesParams> {
        let page = require_text("page", &self.page)?;
        Ok(PageQueriesParams {
            table: table.to_string(),
            site: resolve_site(self.site.as_deref(), page)?,
            page: page.to_string(),
            window: self.window.resolve(today)?,
            limit: self.limit.unwrap_or(DEFAULT_QUERY_LIMIT),
        })
    }
}

/// Which of the two SQL builders a dry run should render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SqlPreviewRequest {
    List(SearchListRequest),
    ByUrl(SearchByUrlRequest),
}

impl SqlPreviewRequest {
    pub fn render(&self, table: &str, today: NaiveDate) -> Result<String> {
        match self {
            SqlPreviewRequest::List(req) => build_page_list_query(&req.to_params(table, today)?),
            SqlPreviewRequest::ByUrl(req) => build_page_queries_query(&req.to_params(table, today)?),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageListResponse {
    pub window: ReportingWindow,
    pub rows: Vec<PageSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageQueriesResponse {
    pub window: ReportingWindow,
    pub summary: KeywordSummary,
    pub rows: Vec<QueryMetric>,
}

/// Page inputs shared by analyze and outline; anything missing is fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInput {
    pub page: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub best_query: Option<String>,
    #[serde(default)]
    pub metrics: Option<Vec<QueryMetric>>,
    #[serde(default)]
    pub article_text: Option<String>,
    #[serde(default)]
    pub fetch_article: bool,
    #[serde(flatten)]
    pub window: WindowRequest,
}

impl PageInput {
    pub fn by_url_request(&self) -> SearchByUrlRequest {
        SearchByUrlRequest {
            page: self.page.clone(),
            site: self.site.clone(),
            window: self.window.clone(),
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(flatten)]
    pub input: PageInput,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub page: String,
    pub provider: String,
    pub analysis_text: String,
    pub analysis: AnalysisData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<KeywordSummary>,
    #[serde(default)]
    pub metrics: Vec<QueryMetric>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAnalyzeRequest {
    pub items: Vec<BatchItem>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub fetch_article: bool,
    #[serde(flatten)]
    pub window: WindowRequest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlineRequest {
    #[serde(flatten)]
    pub input: PageInput,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineResponse {
    pub outline_text: String,
    pub outline: Vec<OutlineSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub page: String,
    pub analysis: String,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub page: String,
    pub analysis_text: String,
    #[serde(default)]
    pub metrics: Vec<QueryMetric>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextVectorRequest {
    pub page: String,
    #[serde(default)]
    pub paragraphs: Option<Vec<String>>,
    #[serde(default)]
    pub article_text: Option<String>,
    #[serde(default)]
    pub fetch_article: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextVectorResponse {
    pub paragraphs: Vec<String>,
    pub suggestions: Vec<ContextVector>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParagraphReviewRequest {
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphReview {
    pub assessment: String,
    pub rewrite: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParagraphOutcome {
    pub index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ParagraphReview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Split free text into paragraphs on blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect()
}

pub fn require_keywords(keywords: &[String]) -> Result<Vec<String>> {
    let cleaned: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if cleaned.is_empty() {
        return Err(LensError::validation("keywords must contain at least one entry"));
    }
    Ok(cleaned)
}
