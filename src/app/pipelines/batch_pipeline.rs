use crate::app::requests::{AnalyzeResponse, BatchAnalyzeRequest, WindowRequest};
use crate::app::Analyzer;
use crate::core::fanout::MAX_FANOUT;
use crate::core::render::{export_bundle, markdown_report};
use crate::domain::model::{BatchItem, BatchOutcome};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{LensError, Result};
use serde::Serialize;
use std::sync::Arc;

pub const BATCH_ARCHIVE: &str = "repostlens_batch.zip";

/// Per-run knobs from the CLI.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub provider: Option<String>,
    pub fetch_article: bool,
    pub window: WindowRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<BatchOutcome<AnalyzeResponse>>,
    #[serde(skip)]
    pub csv_output: String,
    #[serde(skip)]
    pub markdown_output: String,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }
}

/// Reads page rows from a CSV, analyzes them in chunks and writes one ZIP.
pub struct BatchPipeline<S: Storage> {
    storage: S,
    analyzer: Arc<Analyzer>,
    input_path: String,
    output_path: String,
    options: BatchOptions,
}

impl<S: Storage> BatchPipeline<S> {
    pub fn new(
        storage: S,
        analyzer: Arc<Analyzer>,
        input_path: impl Into<String>,
        output_path: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            analyzer,
            input_path: input_path.into(),
            output_path: output_path.into(),
            options: BatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }
}

/// `page` is required; `site` and `best_query` columns are optional.
pub fn parse_batch_csv(data: &[u8]) -> Result<Vec<BatchItem>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h.eq_ignore_ascii_case("page")) {
        return Err(LensError::validation("input CSV needs a 'page' column"));
    }
    let lowered = csv::StringRecord::from(
        headers.iter().map(|h| h.to_lowercase()).collect::<Vec<_>>(),
    );

    let mut items = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let item: BatchItem = record.deserialize(Some(&lowered))?;
        if item.page.trim().is_empty() {
            // 空白列直接略過
            tracing::warn!("Skipping CSV row {} without a page", line + 2);
            continue;
        }
        items.push(item);
    }
    Ok(items)
}

fn results_csv(outcomes: &[BatchOutcome<AnalyzeResponse>]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["page", "success", "strategy", "priority_keywords", "error"])?;
    for outcome in outcomes {
        let (strategy, keywords) = match &outcome.data {
            Some(data) => (
                data.analysis.strategy.as_str().to_string(),
                data.analysis.priority_keywords.join("; "),
            ),
            None => (String::new(), String::new()),
        };
        writer.write_record([
            outcome.page.as_str(),
            if outcome.success { "true" } else { "false" },
            strategy.as_str(),
            keywords.as_str(),
            outcome.error.as_deref().unwrap_or_default(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| LensError::processing(format!("failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| LensError::processing(e.to_string()))
}

fn analyses_markdown(outcomes: &[BatchOutcome<AnalyzeResponse>]) -> String {
    outcomes
        .iter()
        .map(|outcome| match (&outcome.data, &outcome.error) {
            (Some(data), _) => markdown_report(&outcome.page, data.summary.as_ref(), &data.analysis),
            (None, error) => format!(
                "# SEO report: {}\n\nFailed: {}\n",
                outcome.page,
                error.as_deref().unwrap_or("unknown error")
            ),
        })
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for BatchPipeline<S> {
    type Input = BatchItem;
    type Output = BatchResult;

    async fn extract(&self) -> Result<Vec<BatchItem>> {
        tracing::debug!("Reading batch input from: {}", self.input_path);
        let data = self.storage.read_file(&self.input_path).await?;
        let items = parse_batch_csv(&data)?;
        if items.is_empty() {
            return Err(LensError::validation(format!(
                "{} contains no page rows",
                self.input_path
            )));
        }
        Ok(items)
    }

    async fn transform(&self, data: Vec<BatchItem>) -> Result<BatchResult> {
        let mut outcomes = Vec::with_capacity(data.len());

        for (index, chunk) in data.chunks(MAX_FANOUT).enumerate() {
            tracing::info!("Analyzing chunk {} ({} pages)", index + 1, chunk.len());
            let request = BatchAnalyzeRequest {
                items: chunk.to_vec(),
                provider: self.options.provider.clone(),
                fetch_article: self.options.fetch_article,
                window: self.options.window.clone(),
            };
            outcomes.extend(self.analyzer.analyze_batch(&request).await?);
        }

        let result = BatchResult {
            csv_output: results_csv(&outcomes)?,
            markdown_output: analyses_markdown(&outcomes),
            outcomes,
        };
        tracing::info!(
            "Analyzed {} pages: {} succeeded, {} failed",
            result.outcomes.len(),
            result.succeeded(),
            result.outcomes.len() - result.succeeded()
        );
        Ok(result)
    }

    async fn load(&self, result: BatchResult) -> Result<String> {
        let output_path = format!("{}/{}", self.output_path, BATCH_ARCHIVE);
        let json_data = serde_json::to_vec_pretty(&result.outcomes)?;

        tracing::debug!("Creating ZIP file for {} outcomes", result.outcomes.len());
        let zip_data = export_bundle(&[
            ("results.csv", result.csv_output.as_bytes()),
            ("analyses.md", result.markdown_output.as_bytes()),
            ("results.json", json_data.as_slice()),
        ])?;

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(BATCH_ARCHIVE, &zip_data).await?;

        Ok(output_path)
    }
}
