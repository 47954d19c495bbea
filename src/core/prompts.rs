//! Prompt assembly for the LLM-backed operations.
//!
//! The section markers requested here are the ones `core::extract` looks for;
//! change them together.

use crate::domain::model::{GenerationRequest, QueryMetric};

pub const DEFAULT_MAX_ARTICLE_CHARS: usize = 12_000;
pub const MAX_KEYWORD_ROWS: usize = 30;
const TRUNCATION_MARKER: &str = "\n\n[... article truncated ...]";

pub const SEO_SYSTEM_PROMPT: &str = "You are a senior SEO content strategist. You read Google \
Search Console data and article text, and give concrete, page-specific recommendations. \
Answer in the language of the article.";

const ANALYSIS_INSTRUCTIONS: &str = r#"Analyze the page below and answer with exactly these Markdown sections, in this order:

## Search Intent
What the searchers behind the top queries want, in 2-4 sentences.

## Content Gaps
Bullet list of topics the article misses for those queries.

## Semantic Hijacking
Bullet list of adjacent or related queries the page could capture with on-page changes, and how.

## Priority Keywords
Bullet list of at most 10 keywords, most important first. Keywords only, no commentary.

## Recommended Strategy
The first line must be either `Strategy: REPOST` (update and republish this article) or `Strategy: NEW POST` (write a separate article). Then explain why in 2-3 sentences.

## Action Plan
Numbered list of concrete edits."#;

const OUTLINE_INSTRUCTIONS: &str = r#"Write a content outline for the page below.
Use `## ` for each main section and `### ` for its sub-points. Output the outline only, no introduction or closing remarks."#;

const EMAIL_INSTRUCTIONS: &str = r#"Turn the analysis below into a short email for the site owner.
The first line must be `Subject: <subject>`. After a blank line, write the body in Markdown: a one-paragraph summary, then a bullet list of the most important changes."#;

const CONTEXT_VECTOR_INSTRUCTIONS: &str = r#"Suggest content insertions for the article paragraphs below so the page covers the target keywords.
Respond with JSON only, in this shape:
{
  "suggestions": [
    {
      "paragraph_index": <index of the paragraph the insertion belongs to>,
      "anchor": "<short quote from that paragraph>",
      "position": "before" | "after" | "replace",
      "content": "<text to insert, at most 120 words>",
      "target_keyword": "<keyword this insertion targets>",
      "reason": "<one sentence>"
    }
  ]
}
Give at most 10 suggestions."#;

const PARAGRAPH_REVIEW_INSTRUCTIONS: &str = r#"Review the paragraph below against the target keywords.
Answer with these Markdown sections:

## Assessment
One or two sentences.

## Rewrite
The improved paragraph."#;

/// Cut `text` to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn format_position(position: Option<f64>) -> String {
    position
        .map(|p| format!("{:.1}", p))
        .unwrap_or_else(|| "-".to_string())
}

pub fn keyword_table(metrics: &[QueryMetric]) -> String {
    if metrics.is_empty() {
        return "(no search console data)".to_string();
    }

    let mut lines = vec![
        "| Query | Clicks | Impressions | Position | Prev. clicks | Prev. position |".to_string(),
        "|---|---|---|---|---|---|".to_string(),
    ];
    for metric in metrics.iter().take(MAX_KEYWORD_ROWS) {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} |",
            metric.query.replace('|', "/"),
            metric.clicks,
            metric.impressions,
            format_position(metric.position),
            metric
                .prev_clicks
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format_position(metric.prev_position),
        ));
    }
    if metrics.len() > MAX_KEYWORD_ROWS {
        lines.push(format!("({} more queries omitted)", metrics.len() - MAX_KEYWORD_ROWS));
    }
    lines.join("\n")
}

/// Page data shared by the page-level prompts.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub page: &'a str,
    pub best_query: Option<&'a str>,
    pub metrics: &'a [QueryMetric],
    pub article_text: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_article_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ARTICLE_CHARS)
    }
}

impl PromptBuilder {
    pub fn new(max_article_chars: usize) -> Self {
        Self { max_article_chars }
    }

    fn page_block(&self, ctx: &PageContext<'_>) -> String {
        let mut block = format!("Page: {}\n", ctx.page);
        if let Some(best) = ctx.best_query {
            block.push_str(&format!("Best query: {}\n", best));
        }
        block.push_str("\nSearch Console queries (current vs previous period):\n");
        block.push_str(&keyword_table(ctx.metrics));
        match ctx.article_text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => {
                block.push_str("\n\nArticle text:\n\"\"\"\n");
                block.push_str(&truncate_chars(text, self.max_article_chars));
                block.push_str("\n\"\"\"");
            }
            None => block.push_str("\n\nArticle text: (not provided)"),
        }
        block
    }

    pub fn analysis(&self, ctx: &PageContext<'_>) -> GenerationRequest {
        GenerationRequest::new(
            SEO_SYSTEM_PROMPT,
            format!("{}\n\n---\n{}", ANALYSIS_INSTRUCTIONS, self.page_block(ctx)),
        )
    }

    pub fn outline(&self, ctx: &PageContext<'_>, analysis: Option<&str>) -> GenerationRequest {
        let mut prompt = format!("{}\n\n---\n{}", OUTLINE_INSTRUCTIONS, self.page_block(ctx));
        if let Some(analysis) = analysis.map(str::trim).filter(|a| !a.is_empty()) {
            prompt.push_str("\n\nPrevious analysis:\n");
            prompt.push_str(analysis);
        }
        GenerationRequest::new(SEO_SYSTEM_PROMPT, prompt)
    }

    pub fn email(&self, page: &str, analysis: &str, recipient: Option<&str>) -> GenerationRequest {
        let mut prompt = format!("{}\n\n---\nPage: {}\n", EMAIL_INSTRUCTIONS, page);
        if let Some(name) = recipient.map(str::trim).filter(|r| !r.is_empty()) {
            prompt.push_str(&format!("Recipient: {}\n", name));
        }
        prompt.push_str("\nAnalysis:\n");
        prompt.push_str(&truncate_chars(analysis.trim(), self.max_article_chars));
        GenerationRequest::new(SEO_SYSTEM_PROMPT, prompt).with_temperature(0.6)
    }

    pub fn context_vectors(
        &self,
        page: &str,
        paragraphs: &[String],
        keywords: &[String],
    ) -> GenerationRequest {
        let budget = self.max_article_chars / paragraphs.len().max(1);
        let numbered: Vec<String> = paragraphs
            .iter()
            .enumerate()
            .map(|(index, text)| format!("[{}] {}", index, truncate_chars(text.trim(), budget)))
            .collect();
        let prompt = format!(
            "{}\n\n---\nPage: {}\nTarget keywords: {}\n\nParagraphs:\n{}",
            CONTEXT_VECTOR_INSTRUCTIONS,
            page,
            keywords.join(", "),
            numbered.join("\n\n")
        );
        GenerationRequest::new(SEO_SYSTEM_PROMPT, prompt).with_temperature(0.3)
    }

    pub fn paragraph_review(&self, paragraph: &str, keywords: &[String]) -> GenerationRequest {
        GenerationRequest::new(
            SEO_SYSTEM_PROMPT,
            format!(
                "{}\n\n---\nTarget keywords: {}\n\nParagraph:\n{}",
                PARAGRAPH_REVIEW_INSTRUCTIONS,
                keywords.join(", "),
                truncate_chars(paragraph.trim(), self.max_article_chars)
            ),
        )
    }
}
