use crate::adapters::{HttpArticleFetcher, HttpQueryService};
use crate::app::models::ModelRegistry;
use crate::app::requests::*;
use crate::config::settings::Settings;
use crate::core::extract::{extract_analysis_data, parse_email, parse_outline, split_sections, strip_code_fence};
use crate::core::fanout::{ensure_fanout_size, fan_out, MAX_FANOUT};
use crate::core::normalize::{extract_rows, page_summaries, query_metrics, summarize_keywords};
use crate::core::prompts::{PageContext, PromptBuilder};
use crate::core::render::{export_bundle, keywords_csv, markdown_report, markdown_to_email_html};
use crate::core::sql::{build_page_list_query, build_page_queries_query};
use crate::core::suggestions::parse_context_vectors;
use crate::domain::model::{BatchOutcome, EmailDraft, KeywordSummary, QueryMetric};
use crate::domain::ports::{LanguageModel, PageFetcher, QueryService};
use crate::utils::error::{LensError, Result};
use crate::utils::validation::{require_text, validate_url};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

/// Everything a page-level prompt needs, after filling in what the request left out.
struct PageData {
    metrics: Vec<QueryMetric>,
    summary: Option<KeywordSummary>,
    best_query: Option<String>,
    article_text: Option<String>,
}

/// Request orchestration: SQL, normalization, prompts, model call and extraction.
#[derive(Clone)]
pub struct Analyzer {
    query: Arc<dyn QueryService>,
    models: ModelRegistry,
    fetcher: Option<Arc<dyn PageFetcher>>,
    prompts: PromptBuilder,
    table: String,
    concurrency: usize,
    today: Option<NaiveDate>,
}

impl Analyzer {
    pub fn new(query: Arc<dyn QueryService>, models: ModelRegistry, table: impl Into<String>) -> Self {
        Self {
            query,
            models,
            fetcher: None,
            prompts: PromptBuilder::default(),
            table: table.into(),
            concurrency: MAX_FANOUT,
            today: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let query = HttpQueryService::new(
            settings.query.endpoint.clone(),
            settings.query.token.clone(),
            Duration::from_secs(settings.query.timeout_seconds),
        )?;
        let models = ModelRegistry::from_settings(&settings.llm)?;
        let fetcher = HttpArticleFetcher::new(Duration::from_secs(30))?;

        Ok(Self::new(Arc::new(query), models, settings.query.table.clone())
            .with_fetcher(Arc::new(fetcher))
            .with_max_article_chars(settings.llm.max_article_chars)
            .with_concurrency(settings.batch.concurrency))
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_max_article_chars(mut self, max_chars: usize) -> Self {
        self.prompts = PromptBuilder::new(max_chars);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_FANOUT);
        self
    }

    /// Pin "today" for window resolution.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn providers(&self) -> Vec<String> {
        self.models.providers()
    }

    pub fn default_provider(&self) -> &str {
        self.models.default_provider()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    pub fn sql_preview(&self, request: &SqlPreviewRequest) -> Result<String> {
        request.render(&self.table, self.today())
    }

    pub async fn list_pages(&self, request: &SearchListRequest) -> Result<PageListResponse> {
        let params = request.to_params(&self.table, self.today())?;
        let sql = build_page_list_query(&params)?;
        tracing::info!(site = %params.site, limit = params.limit, "Querying page list");

        let rows = extract_rows(self.query.execute(&sql).await?)?;
        let pages = page_summaries(&rows);
        tracing::debug!("Page list returned {} rows, {} usable", rows.len(), pages.len());

        Ok(PageListResponse {
            window: params.window,
            rows: pages,
        })
    }

    pub async fn page_queries(&self, request: &SearchByUrlRequest) -> Result<PageQueriesResponse> {
        let params = request.to_params(&self.table, self.today())?;
        let sql = build_page_queries_query(&params)?;
        tracing::info!(page = %params.page, "Querying keywords for page");

        let rows = extract_rows(self.query.execute(&sql).await?)?;
        let metrics = query_metrics(&rows);
        let summary = summarize_keywords(&metrics);

        Ok(PageQueriesResponse {
            window: params.window,
            summary,
            rows: metrics,
        })
    }

    async fn article_text(&self, page: &str) -> Result<String> {
        let fetcher = self
            .fetcher
            .as_ref()
            .ok_or_else(|| LensError::validation("article fetching is not available"))?;
        let article = fetcher.fetch_article(page).await?;
        tracing::debug!("Fetched {} paragraphs from {}", article.paragraphs.len(), page);
        Ok(article.text())
    }

    async fn gather(&self, input: &PageInput) -> Result<PageData> {
        require_text("page", &input.page)?;

        let (metrics, summary) = match &input.metrics {
            Some(metrics) => (metrics.clone(), Some(summarize_keywords(metrics))),
            None => {
                let response = self.page_queries(&input.by_url_request()).await?;
                (response.rows, Some(response.summary))
            }
        };

        let article_text = match input.article_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(text.to_string()),
            _ if input.fetch_article => Some(self.article_text(&input.page).await?),
            _ => None,
        };

        let best_query = input
            .best_query
            .clone()
            .filter(|q| !q.trim().is_empty())
            .or_else(|| summary.as_ref().and_then(|s| s.best_query.clone()));

        Ok(PageData {
            metrics,
            summary,
            best_query,
            article_text,
        })
    }

    async fn generate(
        &self,
        model: &dyn LanguageModel,
        what: &str,
        request: crate::domain::model::GenerationRequest,
    ) -> Result<String> {
        tracing::info!(provider = model.name(), "Generating {}", what);
        let text = model.generate(&request).await?;
        tracing::debug!("{} response: {} chars", what, text.len());
        Ok(text)
    }

    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse> {
        let model = self.models.select(request.provider.as_deref())?;
        let data = self.gather(&request.input).await?;

        let ctx = PageContext {
            page: &request.input.page,
            best_query: data.best_query.as_deref(),
            metrics: &data.metrics,
            article_text: data.article_text.as_deref(),
        };
        let analysis_text = self
            .generate(model.as_ref(), "analysis", self.prompts.analysis(&ctx))
            .await?;
        let analysis = extract_analysis_data(&analysis_text);
        tracing::info!(
            page = %request.input.page,
            strategy = analysis.strategy.as_str(),
            "Analysis complete"
        );

        Ok(AnalyzeResponse {
            page: request.input.page.clone(),
            provider: model.name().to_string(),
            analysis_text,
            analysis,
            summary: data.summary,
            metrics: data.metrics,
        })
    }

    /// Per-item isolation: one failing page never fails the batch.
    pub async fn analyze_batch(
        &self,
        request: &BatchAnalyzeRequest,
    ) -> Result<Vec<BatchOutcome<AnalyzeResponse>>> {
        ensure_fanout_size("items", request.items.len())?;
        // 先確認 provider 可用，避免每個項目各自失敗
        self.models.select(request.provider.as_deref())?;

        let pages: Vec<String> = request.items.iter().map(|item| item.page.clone()).collect();
        let results = fan_out(request.items.clone(), self.concurrency, |item| {
            let analyze = AnalyzeRequest {
                input: PageInput {
                    page: item.page,
                    site: item.site,
                    best_query: item.best_query,
                    fetch_article: request.fetch_article,
                    window: request.window.clone(),
                    ..PageInput::default()
                },
                provider: request.provider.clone(),
            };
            async move { self.analyze(&analyze).await }
        })
        .await;

        Ok(pages
            .into_iter()
            .zip(results)
            .map(|(page, result)| match result {
                Ok(response) => BatchOutcome::ok(page, response),
                Err(e) => {
                    tracing::warn!("Batch item {} failed: {}", page, e);
                    BatchOutcome::failed(page, e.to_string())
                }
            })
            .collect())
    }

    pub async fn outline(&self, request: &OutlineRequest) -> Result<OutlineResponse> {
        let model = self.models.select(request.provider.as_deref())?;
        let data = self.gather(&request.input).await?;

        let ctx = PageContext {
            page: &request.input.page,
            best_query: data.best_query.as_deref(),
            metrics: &data.metrics,
            article_text: data.article_text.as_deref(),
        };
        let outline_text = self
            .generate(
                model.as_ref(),
                "outline",
                self.prompts.outline(&ctx, request.analysis.as_deref()),
            )
            .await?;
        let outline = parse_outline(&outline_text);
        if outline.is_empty() {
            return Err(LensError::extraction("outline", "no headings found in model output"));
        }

        Ok(OutlineResponse {
            outline_text,
            outline,
        })
    }

    pub async fn email(&self, request: &EmailRequest) -> Result<EmailDraft> {
        let page = require_text("page", &request.page)?;
        let analysis = require_text("analysis", &request.analysis)?;
        let model = self.models.select(request.provider.as_deref())?;

        let text = self
            .generate(
                model.as_ref(),
                "email",
                self.prompts.email(page, analysis, request.recipient.as_deref()),
            )
            .await?;
        let (subject, markdown) = parse_email(&text, &format!("SEO recommendations for {}", page));
        let html = markdown_to_email_html(&markdown);

        Ok(EmailDraft {
            subject,
            markdown,
            html,
        })
    }

    /// ZIP with `report.md`, `keywords.csv` and `analysis.json`. No model call.
    pub fn export(&self, request: &ExportRequest) -> Result<Vec<u8>> {
        let page = require_text("page", &request.page)?;
        let analysis_text = require_text("analysis_text", &request.analysis_text)?;

        let analysis = extract_analysis_data(analysis_text);
        let summary = (!request.metrics.is_empty()).then(|| summarize_keywords(&request.metrics));

        let report = markdown_report(page, summary.as_ref(), &analysis);
        let keywords = keywords_csv(&request.metrics)?;
        let json = serde_json::to_vec_pretty(&serde_json::json!({
            "page": page,
            "summary": summary,
            "analysis": analysis,
            "analysis_text": analysis_text,
        }))?;

        export_bundle(&[
            ("report.md", report.as_bytes()),
            ("keywords.csv", keywords.as_bytes()),
            ("analysis.json", json.as_slice()),
        ])
    }

    pub async fn context_vectors(&self, request: &ContextVectorRequest) -> Result<ContextVectorResponse> {
        let page = require_text("page", &request.page)?;
        let keywords = require_keywords(&request.keywords)?;
        let model = self.models.select(request.provider.as_deref())?;

        let paragraphs = match (&request.paragraphs, request.article_text.as_deref()) {
            (Some(paragraphs), _) => paragraphs
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            (None, Some(text)) if !text.trim().is_empty() => split_paragraphs(text),
            _ if request.fetch_article => {
                validate_url("page", page)?;
                split_paragraphs(&self.article_text(page).await?)
            }
            _ => Vec::new(),
        };
        if paragraphs.is_empty() {
            return Err(LensError::validation(
                "provide paragraphs, article_text or set fetch_article",
            ));
        }

        let text = self
            .generate(
                model.as_ref(),
                "context vectors",
                self.prompts.context_vectors(page, &paragraphs, &keywords),
            )
            .await?;
        let suggestions = parse_context_vectors(&text, paragraphs.len())?;

        Ok(ContextVectorResponse {
            paragraphs,
            suggestions,
        })
    }

    pub async fn review_paragraphs(&self, request: &ParagraphReviewRequest) -> Result<Vec<ParagraphOutcome>> {
        ensure_fanout_size("paragraphs", request.paragraphs.len())?;
        let keywords = require_keywords(&request.keywords)?;
        let model = self.models.select(request.provider.as_deref())?;

        let indexed: Vec<(usize, String)> = request.paragraphs.iter().cloned().enumerate().collect();
        let results = fan_out(indexed, self.concurrency, |(index, paragraph)| {
            let model = model.clone();
            let keywords = &keywords;
            async move {
                let paragraph = require_text("paragraph", &paragraph)?;
                let text = model
                    .generate(&self.prompts.paragraph_review(paragraph, keywords))
                    .await?;
                tracing::debug!("Paragraph {} reviewed", index);
                Ok(parse_paragraph_review(&text))
            }
        })
        .await;

        Ok(results
            .into_iter()
            .enumerate()
            .map(|(index, result)| match result {
                Ok(review) => ParagraphOutcome {
                    index,
                    success: true,
                    review: Some(review),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("Paragraph {} failed: {}", index, e);
                    ParagraphOutcome {
                        index,
                        success: false,
                        review: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect())
    }
}

/// `## Assessment` / `## Rewrite`; without those the whole reply is the rewrite.
pub fn parse_paragraph_review(text: &str) -> ParagraphReview {
    let mut assessment = String::new();
    let mut rewrite = String::new();

    for section in split_sections(strip_code_fence(text)) {
        let title = section.title.as_deref().unwrap_or_default().to_lowercase();
        if title.contains("assessment") || title.contains("評估") {
            assessment = section.body.trim().to_string();
        } else if title.contains("rewrite") || title.contains("改寫") {
            rewrite = section.body.trim().to_string();
        }
    }

    if rewrite.is_empty() {
        rewrite = strip_code_fence(text).trim().to_string();
    }
    ParagraphReview { assessment, rewrite }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Article, GenerationRequest, Strategy};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticQuery(serde_json::Value);

    #[async_trait]
    impl QueryService for StaticQuery {
        async fn execute(&self, _sql: &str) -> Result<serde_json::Value> {
            Ok(self.0.clone())
        }
    }

    /// Echoes a canned reply and records every prompt it saw.
    struct ScriptedModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "openai"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            if request.prompt.contains("FAIL-ME") {
                return Err(LensError::upstream("openai", 500, "boom"));
            }
            Ok(self.reply.clone())
        }
    }

    struct StaticFetcher;

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch_article(&self, url: &str) -> Result<Article> {
            Ok(Article {
                url: url.to_string(),
                title: Some("Guide".to_string()),
                paragraphs: vec!["Intro paragraph.".to_string(), "Second paragraph.".to_string()],
            })
        }
    }

    /// Pages under `/broken` answer like an origin that is down.
    struct FlakyFetcher;

    #[async_trait]
    impl PageFetcher for FlakyFetcher {
        async fn fetch_article(&self, url: &str) -> Result<Article> {
            if url.contains("/broken") {
                return Err(LensError::upstream("article", 503, "Service Unavailable"));
            }
            StaticFetcher.fetch_article(url).await
        }
    }

    const ANALYSIS: &str = "## Search Intent\nPeople compare plans.\n\n## Priority Keywords\n- seo audit\n- seo checklist\n\n## Recommended Strategy\nStrategy: REPOST\n\n## Action Plan\n1. Add a checklist";

    fn query_rows() -> serde_json::Value {
        serde_json::json!([
            { "page": "https://example.com/guide", "query": "seo audit", "clicks": 40, "impressions": 900, "position": 2.5 },
            { "page": "https://example.com/guide", "query": "seo checklist", "clicks": "12", "impressions": "300", "position": "8.1" }
        ])
    }

    fn analyzer(model: Arc<ScriptedModel>) -> Analyzer {
        Analyzer::new(
            Arc::new(StaticQuery(query_rows())),
            ModelRegistry::new("openai").with_model(model),
            "gsc.rows",
        )
        .with_fetcher(Arc::new(StaticFetcher))
        .with_today(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
    }

    fn analyze_request(page: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            input: PageInput {
                page: page.to_string(),
                ..PageInput::default()
            },
            provider: None,
        }
    }

    #[tokio::test]
    async fn test_page_queries_summarizes_rows() {
        let analyzer = analyzer(ScriptedModel::new(ANALYSIS));
        let response = analyzer
            .page_queries(&SearchByUrlRequest {
                page: "https://example.com/guide".to_string(),
                site: None,
                window: WindowRequest::default(),
                limit: None,
            })
            .await
            .unwrap();

        assert_eq!(response.rows.len(), 2);
        assert_eq!(response.summary.total_clicks, 52);
        assert_eq!(response.summary.best_query.as_deref(), Some("seo audit"));
    }

    #[tokio::test]
    async fn test_analyze_fetches_metrics_and_article() {
        let model = ScriptedModel::new(ANALYSIS);
        let analyzer = analyzer(model.clone());
        let mut request = analyze_request("https://example.com/guide");
        request.input.fetch_article = true;

        let response = analyzer.analyze(&request).await.unwrap();

        assert_eq!(response.analysis.strategy, Strategy::Repost);
        assert_eq!(response.analysis.priority_keywords, vec!["seo audit", "seo checklist"]);
        assert_eq!(response.summary.unwrap().keyword_count, 2);

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Best query: seo audit"));
        assert!(prompts[0].contains("Intro paragraph."));
    }

    #[tokio::test]
    async fn test_analyze_rejects_unconfigured_provider() {
        let analyzer = analyzer(ScriptedModel::new(ANALYSIS));
        let mut request = analyze_request("https://example.com/guide");
        request.provider = Some("vertex".to_string());

        let err = analyzer.analyze(&request).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_analyze_batch_isolates_failures() {
        let analyzer = analyzer(ScriptedModel::new(ANALYSIS));
        let request = BatchAnalyzeRequest {
            items: vec![
                crate::domain::model::BatchItem {
                    page: "https://example.com/guide".to_string(),
                    site: None,
                    best_query: None,
                },
                crate::domain::model::BatchItem {
                    page: "not a url".to_string(),
                    site: None,
                    best_query: None,
                },
            ],
            provider: None,
            fetch_article: false,
            window: WindowRequest::default(),
        };

        let outcomes = analyzer.analyze_batch(&request).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].page, "not a url");
    }

    #[tokio::test]
    async fn test_analyze_fails_when_article_fetch_fails() {
        let model = ScriptedModel::new(ANALYSIS);
        let analyzer = analyzer(model.clone()).with_fetcher(Arc::new(FlakyFetcher));
        let mut request = analyze_request("https://example.com/broken");
        request.input.fetch_article = true;

        let err = analyzer.analyze(&request).await.unwrap_err();

        assert_eq!(err.status_code(), 502);
        assert!(err.to_string().contains("Service Unavailable"));
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_batch_marks_failed_fetch_item() {
        let analyzer = analyzer(ScriptedModel::new(ANALYSIS)).with_fetcher(Arc::new(FlakyFetcher));
        let item = |page: &str| crate::domain::model::BatchItem {
            page: page.to_string(),
            site: None,
            best_query: None,
        };
        let request = BatchAnalyzeRequest {
            items: vec![item("https://example.com/guide"), item("https://example.com/broken")],
            provider: None,
            fetch_article: true,
            window: WindowRequest::default(),
        };

        let outcomes = analyzer.analyze_batch(&request).await.unwrap();

        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert!(outcomes[1].data.is_none());
        assert!(outcomes[1].error.as_deref().unwrap().contains("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_analyze_batch_rejects_oversized_input() {
        let analyzer = analyzer(ScriptedModel::new(ANALYSIS));
        let item = crate::domain::model::BatchItem {
            page: "https://example.com/a".to_string(),
            site: None,
            best_query: None,
        };
        let request = BatchAnalyzeRequest {
            items: vec![item; MAX_FANOUT + 1],
            provider: None,
            fetch_article: false,
            window: WindowRequest::default(),
        };

        assert_eq!(analyzer.analyze_batch(&request).await.unwrap_err().status_code(), 400);
    }

    #[tokio::test]
    async fn test_outline_requires_headings() {
        let analyzer = analyzer(ScriptedModel::new("Just some prose without headings."));
        let request = OutlineRequest {
            input: PageInput {
                page: "https://example.com/guide".to_string(),
                metrics: Some(Vec::new()),
                ..PageInput::default()
            },
            ..OutlineRequest::default()
        };

        assert_eq!(analyzer.outline(&request).await.unwrap_err().status_code(), 422);
    }

    #[tokio::test]
    async fn test_email_parses_subject_and_renders_html() {
        let analyzer = analyzer(ScriptedModel::new("Subject: Refresh the SEO guide\n\nUpdate the **intro**."));
        let draft = analyzer
            .email(&EmailRequest {
                page: "https://example.com/guide".to_string(),
                analysis: ANALYSIS.to_string(),
                recipient: Some("Kim".to_string()),
                provider: None,
            })
            .await
            .unwrap();

        assert_eq!(draft.subject, "Refresh the SEO guide");
        assert!(draft.html.contains("<strong>intro</strong>"));
    }

    #[test]
    fn test_export_contains_three_files() {
        let analyzer = analyzer(ScriptedModel::new(ANALYSIS));
        let bytes = analyzer
            .export(&ExportRequest {
                page: "https://example.com/guide".to_string(),
                analysis_text: ANALYSIS.to_string(),
                metrics: Vec::new(),
            })
            .unwrap();

        let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["analysis.json", "keywords.csv", "report.md"]);
    }

    #[tokio::test]
    async fn test_context_vectors_from_article_text() {
        let reply = r#"{"suggestions":[{"paragraph_index":1,"position":"after","content":"Add a checklist.","target_keyword":"seo checklist"}]}"#;
        let analyzer = analyzer(ScriptedModel::new(reply));
        let response = analyzer
            .context_vectors(&ContextVectorRequest {
                page: "https://example.com/guide".to_string(),
                article_text: Some("First.\n\nSecond.".to_string()),
                keywords: vec!["seo checklist".to_string()],
                ..ContextVectorRequest::default()
            })
            .await
            .unwrap();

        assert_eq!(response.paragraphs.len(), 2);
        assert_eq!(response.suggestions[0].paragraph_index, Some(1));
    }

    #[tokio::test]
    async fn test_context_vectors_requires_text() {
        let analyzer = analyzer(ScriptedModel::new("{}"));
        let err = analyzer
            .context_vectors(&ContextVectorRequest {
                page: "https://example.com/guide".to_string(),
                keywords: vec!["seo".to_string()],
                ..ContextVectorRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_review_paragraphs_per_item_results() {
        let analyzer = analyzer(ScriptedModel::new("## Assessment\nThin.\n\n## Rewrite\nBetter text."));
        let results = analyzer
            .review_paragraphs(&ParagraphReviewRequest {
                paragraphs: vec!["Good one.".to_string(), "FAIL-ME".to_string(), " ".to_string()],
                keywords: vec!["seo".to_string()],
                provider: None,
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].review.as_ref().unwrap().rewrite, "Better text.");
        assert!(!results[1].success);
        assert!(!results[2].success);
    }

    #[test]
    fn test_parse_paragraph_review_without_sections() {
        let review = parse_paragraph_review("Just the new paragraph.");
        assert_eq!(review.assessment, "");
        assert_eq!(review.rewrite, "Just the new paragraph.");
    }
}
