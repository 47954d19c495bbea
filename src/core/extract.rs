//! Best-effort parsing of LLM free text into structured fields.
//!
//! Models do not follow formatting instructions reliably, so every extractor
//! here degrades to an empty or `Unknown` value instead of failing.

use crate::domain::model::{AnalysisData, OutlineSection, Section, Strategy};
use crate::utils::error::{LensError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const MAX_PRIORITY_KEYWORDS: usize = 10;

static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}#{1,4}\s+(.+?)\s*#*\s*$").expect("valid regex"));
static BRACKET_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*【(.+?)】\s*$").expect("valid regex"));
static BOLD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*\*([^*]+?)\*\*\s*[:：]?\s*$").expect("valid regex"));
static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+|[一二三四五六七八九十]+)\s*[.)、:：]\s*").expect("valid regex"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•+]|\d+[.)、])\s+(.+?)\s*$").expect("valid regex"));
static EXPLICIT_STRATEGY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[\s>*_#-]*(?:recommended\s+)?(?:strategy|建議策略|策略)[\s*_]*[:：][\s*_`「\x22]*(repost|new[\s_-]*post|舊文優化|重新發布|新文章)",
    )
    .expect("valid regex")
});
static REPOST_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\brepost\b|舊文優化|重新發布").expect("valid regex"));
static NEW_POST_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnew[\s_-]*post\b|新文章").expect("valid regex"));
static OUTLINE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}(#{2,3})\s+(.+?)\s*#*\s*$").expect("valid regex"));
static SUBJECT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*[*_]*\s*(?:subject|主旨|主題)\s*[*_]*\s*[:：][\s*_]*(.+?)[\s*_]*$")
        .expect("valid regex")
});
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n(.*?)```").expect("valid regex"));
static TRAILING_NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:[（(][^）)]*[）)]|\s[-–—]\s.*|[:：].*)$").expect("valid regex"));

fn heading_title(line: &str) -> Option<String> {
    let raw = MARKDOWN_HEADING
        .captures(line)
        .or_else(|| BRACKET_HEADING.captures(line))
        .or_else(|| BOLD_HEADING.captures(line))?
        .get(1)?
        .as_str();
    let stripped = strip_emphasis(raw);
    let title = NUMBER_PREFIX.replace(stripped.trim(), "");
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "").replace('`', "")
}

/// Split model output on headings. Text before the first heading becomes an
/// untitled section when it is not blank.
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut title: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    let mut flush = |title: Option<String>, body: &mut Vec<&str>| {
        let text = body.join("\n").trim().to_string();
        if title.is_some() || !text.is_empty() {
            sections.push(Section { title, body: text });
        }
        body.clear();
    };

    for line in text.lines() {
        if let Some(next) = heading_title(line) {
            flush(title.take(), &mut body);
            title = Some(next);
        } else {
            body.push(line);
        }
    }
    flush(title, &mut body);
    sections
}

pub fn extract_strategy(text: &str) -> Strategy {
    if let Some(caps) = EXPLICIT_STRATEGY.captures(text) {
        return classify_strategy_token(&caps[1]);
    }

    match (REPOST_TOKEN.is_match(text), NEW_POST_TOKEN.is_match(text)) {
        (true, false) => Strategy::Repost,
        (false, true) => Strategy::NewPost,
        _ => Strategy::Unknown,
    }
}

fn classify_strategy_token(token: &str) -> Strategy {
    if NEW_POST_TOKEN.is_match(token) {
        Strategy::NewPost
    } else {
        Strategy::Repost
    }
}

fn clean_item(item: &str) -> String {
    strip_emphasis(item)
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '「' | '」' | '『' | '』'))
        .trim()
        .to_string()
}

pub fn extract_list_items(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| LIST_ITEM.captures(line))
        .map(|caps| clean_item(&caps[1]))
        .filter(|item| !item.is_empty())
        .collect()
}

fn clean_keyword(item: &str) -> String {
    clean_item(&TRAILING_NOTE.replace(item, ""))
}

fn find_section<'a>(sections: &'a [Section], needles: &[&str]) -> Option<&'a Section> {
    needles.iter().find_map(|needle| {
        sections.iter().find(|section| {
            section
                .title
                .as_deref()
                .is_some_and(|title| title.to_lowercase().contains(needle))
        })
    })
}

pub fn extract_analysis_data(text: &str) -> AnalysisData {
    let sections = split_sections(text);

    let mut seen = HashSet::new();
    let priority_keywords: Vec<String> = find_section(&sections, &["keyword", "關鍵字", "关键词"])
        .map(|section| extract_list_items(&section.body))
        .unwrap_or_default()
        .iter()
        .map(|item| clean_keyword(item))
        .filter(|keyword| !keyword.is_empty() && seen.insert(keyword.to_lowercase()))
        .take(MAX_PRIORITY_KEYWORDS)
        .collect();

    let action_items = find_section(&sections, &["action", "行動", "plan", "步驟"])
        .map(|section| extract_list_items(&section.body))
        .unwrap_or_default();

    let search_intent = find_section(&sections, &["intent", "意圖"])
        .map(|section| section.body.trim().to_string())
        .filter(|body| !body.is_empty());

    let strategy = match find_section(&sections, &["strategy", "策略"]).map(|s| extract_strategy(&s.body)) {
        Some(strategy) if strategy != Strategy::Unknown => strategy,
        _ => extract_strategy(text),
    };

    AnalysisData {
        strategy,
        search_intent,
        priority_keywords,
        action_items,
        sections,
    }
}

/// Remove one wrapping code fence, which models like to add around Markdown.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let (Some(newline), true) = (rest.find('\n'), rest.ends_with("```")) {
            let inner = &rest[newline + 1..rest.len() - 3];
            return inner.trim();
        }
    }
    trimmed
}

pub fn parse_outline(text: &str) -> Vec<OutlineSection> {
    let mut outline: Vec<OutlineSection> = Vec::new();

    for line in strip_code_fence(text).lines() {
        if let Some(caps) = OUTLINE_HEADING.captures(line) {
            let heading = clean_item(&caps[2]);
            if caps[1].len() == 2 {
                outline.push(OutlineSection {
                    heading,
                    subheadings: Vec::new(),
                });
            } else {
                if outline.is_empty() {
                    outline.push(OutlineSection {
                        heading: String::new(),
                        subheadings: Vec::new(),
                    });
                }
                if let Some(current) = outline.last_mut() {
                    current.subheadings.push(heading);
                }
            }
        } else if let Some(caps) = LIST_ITEM.captures(line) {
            if let Some(current) = outline.last_mut() {
                current.subheadings.push(clean_item(&caps[1]));
            }
        }
    }

    outline
}

/// Returns `(subject, markdown_body)`.
pub fn parse_email(text: &str, fallback_subject: &str) -> (String, String) {
    let text = strip_code_fence(text);
    let mut subject = None;
    let mut body = Vec::new();

    for line in text.lines() {
        if subject.is_none() {
            if let Some(caps) = SUBJECT_LINE.captures(line) {
                subject = Some(clean_item(&caps[1]));
                continue;
            }
        }
        body.push(line);
    }

    let subject = subject
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback_subject.to_string());
    (subject, body.join("\n").trim().to_string())
}

/// Find the JSON payload in model output: a fenced block first, then the first
/// balanced object or array.
pub fn extract_json_block(text: &str) -> Option<&str> {
    for caps in FENCED_BLOCK.captures_iter(text) {
        if let Some(inner) = caps.get(1) {
            let inner = inner.as_str().trim();
            if inner.starts_with('{') || inner.starts_with('[') {
                return Some(inner);
            }
        }
    }

    let start = text.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn parse_json_payload(text: &str) -> Result<serde_json::Value> {
    let block = extract_json_block(text)
        .ok_or_else(|| LensError::extraction("JSON", "no JSON object or array found"))?;
    serde_json::from_str(block).map_err(|e| LensError::extraction("JSON", e.to_string()))
}
