use crate::core::extract::parse_json_payload;
use crate::domain::model::{ContextVector, InsertPosition};
use crate::utils::error::{LensError, Result};
use serde::Deserialize;
use serde_json::Value;

pub const MAX_SUGGESTIONS: usize = 10;
pub const MAX_SUGGESTION_CHARS: usize = 800;

/// Loose shape of one suggestion as models actually emit it.
#[derive(Debug, Deserialize)]
struct RawSuggestion {
    #[serde(default, alias = "paragraphIndex", alias = "index")]
    paragraph_index: Option<Value>,
    #[serde(default)]
    anchor: Option<String>,
    #[serde(default, alias = "insert", alias = "placement")]
    position: Option<String>,
    #[serde(default, alias = "text", alias = "suggestion")]
    content: Option<String>,
    #[serde(default, alias = "targetKeyword", alias = "keyword")]
    target_keyword: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

fn parse_position(value: Option<&str>) -> std::result::Result<InsertPosition, String> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("after") => Ok(InsertPosition::After),
        Some("before") => Ok(InsertPosition::Before),
        Some("replace") => Ok(InsertPosition::Replace),
        Some(other) => Err(format!("unknown position '{}'", other)),
    }
}

fn parse_index(value: Option<&Value>) -> std::result::Result<Option<usize>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| format!("invalid paragraph_index {}", n)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| format!("invalid paragraph_index '{}'", s)),
        Some(other) => Err(format!("invalid paragraph_index {}", other)),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate(raw: RawSuggestion, paragraph_count: usize) -> std::result::Result<ContextVector, String> {
    let content = non_blank(raw.content).ok_or("content is empty")?;
    if content.chars().count() > MAX_SUGGESTION_CHARS {
        return Err(format!("content exceeds {} characters", MAX_SUGGESTION_CHARS));
    }

    let paragraph_index = parse_index(raw.paragraph_index.as_ref())?;
    if let Some(index) = paragraph_index {
        if paragraph_count > 0 && index >= paragraph_count {
            return Err(format!(
                "paragraph_index {} out of range (0..{})",
                index, paragraph_count
            ));
        }
    }

    Ok(ContextVector {
        paragraph_index,
        anchor: non_blank(raw.anchor),
        position: parse_position(raw.position.as_deref())?,
        content,
        target_keyword: non_blank(raw.target_keyword),
        reason: non_blank(raw.reason),
    })
}

/// Parse and validate context-vector suggestions from model output.
///
/// Invalid entries are dropped; the call only fails when nothing usable is left.
pub fn parse_context_vectors(text: &str, paragraph_count: usize) -> Result<Vec<ContextVector>> {
    let payload = parse_json_payload(text)?;
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("suggestions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(LensError::extraction(
                    "context vectors",
                    "JSON object has no suggestions array",
                ))
            }
        },
        _ => {
            return Err(LensError::extraction(
                "context vectors",
                "expected a JSON object or array",
            ))
        }
    };

    let mut suggestions = Vec::new();
    for (position, item) in items.into_iter().enumerate() {
        let raw: RawSuggestion = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Dropping suggestion #{}: {}", position, e);
                continue;
            }
        };
        match validate(raw, paragraph_count) {
            Ok(suggestion) => suggestions.push(suggestion),
            Err(reason) => tracing::warn!("Dropping suggestion #{}: {}", position, reason),
        }
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
    }

    if suggestions.is_empty() {
        return Err(LensError::extraction(
            "context vectors",
            "model returned no valid suggestions",
        ));
    }
    Ok(suggestions)
}
