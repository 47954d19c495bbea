//! Article fetcher: plain HTTP GET plus HTML parsing, no JavaScript rendering.

use crate::domain::model::Article;
use crate::domain::ports::PageFetcher;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; RepostLens/0.1; +https://example.com/bot)";

const CONTENT_SELECTORS: [&str; 6] = [
    "article",
    "main",
    "[role='main']",
    ".post-content",
    ".entry-content",
    "body",
];

const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, p, li";
const SKIPPED_ANCESTORS: [&str; 7] = ["script", "style", "nav", "header", "footer", "aside", "noscript"];

#[derive(Debug, Clone)]
pub struct HttpArticleFetcher {
    client: Client,
}

impl HttpArticleFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn inside_skipped(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|el| SKIPPED_ANCESTORS.contains(&el.name()))
    })
}

/// Pull the title and readable paragraphs out of an HTML document.
pub fn parse_article(url: &str, html: &str) -> Article {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        })
        .filter(|t| !t.is_empty());

    let Ok(blocks) = Selector::parse(BLOCK_SELECTOR) else {
        return Article {
            url: url.to_string(),
            title,
            paragraphs: Vec::new(),
        };
    };

    let mut paragraphs = Vec::new();
    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        let Some(root) = document.select(&selector).next() else {
            continue;
        };

        paragraphs = root
            .select(&blocks)
            .filter(|el| !inside_skipped(el))
            // 巢狀區塊（li 內的 p）只取最外層，避免文字重複
            .filter(|el| {
                !el.ancestors().any(|node| {
                    node.value()
                        .as_element()
                        .is_some_and(|parent| matches!(parent.name(), "p" | "li"))
                })
            })
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .collect();

        if !paragraphs.is_empty() {
            break;
        }
    }

    Article {
        url: url.to_string(),
        title,
        paragraphs,
    }
}

#[async_trait]
impl PageFetcher for HttpArticleFetcher {
    async fn fetch_article(&self, url: &str) -> Result<Article> {
        tracing::debug!("Fetching article {}", url);
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LensError::upstream("article", status.as_u16(), format!("GET {} failed", url)));
        }

        let html = response.text().await?;
        let article = parse_article(url, &html);
        if article.paragraphs.is_empty() {
            tracing::warn!("No readable text found at {}", url);
        }
        Ok(article)
    }
}
