use crate::domain::model::{KeywordSummary, PageSummary, QueryMetric, RankBucket, RankBuckets};
use crate::utils::error::{LensError, Result};
use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

const ROW_KEYS: [&str; 3] = ["data", "rows", "results"];

/// Pull the row array out of whatever envelope the query service used.
pub fn extract_rows(value: Value) -> Result<Vec<Row>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            if let Some(error) = obj.get("error").filter(|e| !e.is_null()) {
                let message = match error {
                    Value::String(message) => message.clone(),
                    Value::Object(inner) => inner
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                    other => other.to_string(),
                };
                return Err(LensError::upstream("query", 200, message));
            }

            match ROW_KEYS.iter().find_map(|key| match obj.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }) {
                Some(items) => items,
                None => {
                    return Err(LensError::processing(
                        "query response has no row array (expected data, rows or results)",
                    ))
                }
            }
        }
        Value::Null => Vec::new(),
        other => {
            return Err(LensError::processing(format!(
                "unexpected query response type: {}",
                json_type(&other)
            )))
        }
    };

    let total = items.len();
    let rows: Vec<Row> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(obj),
            _ => None,
        })
        .collect();

    if rows.len() < total {
        tracing::warn!("Skipped {} non-object rows in query response", total - rows.len());
    }
    Ok(rows)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Numbers may arrive as JSON numbers, numeric strings or null.
pub fn lenient_f64(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

pub fn lenient_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0).round() as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.max(0.0).round() as u64)
            })
        }
        _ => None,
    }
}

fn text(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn count(row: &Row, key: &str) -> u64 {
    lenient_u64(row.get(key)).unwrap_or(0)
}

pub fn page_summaries(rows: &[Row]) -> Vec<PageSummary> {
    rows.iter()
        .filter_map(|row| {
            let Some(page) = text(row, "page") else {
                tracing::warn!("Skipping list row without page: {:?}", row);
                return None;
            };

            let mut ranks = RankBuckets::default();
            for bucket in RankBucket::ALL {
                ranks.add(bucket, count(row, &format!("rank_{}", bucket.as_str())));
            }

            Some(PageSummary {
                page,
                best_query: text(row, "best_query"),
                best_query_clicks: count(row, "best_query_clicks"),
                best_query_impressions: count(row, "best_query_impressions"),
                best_query_position: lenient_f64(row.get("best_query_position")),
                prev_best_query_clicks: lenient_u64(row.get("prev_best_query_clicks")),
                prev_best_query_position: lenient_f64(row.get("prev_best_query_position")),
                total_clicks: count(row, "total_clicks"),
                total_impressions: count(row, "total_impressions"),
                prev_total_clicks: lenient_u64(row.get("prev_total_clicks")),
                prev_total_impressions: lenient_u64(row.get("prev_total_impressions")),
                keyword_count: count(row, "keyword_count"),
                ranks,
            })
        })
        .collect()
}

pub fn query_metrics(rows: &[Row]) -> Vec<QueryMetric> {
    rows.iter()
        .filter_map(|row| {
            let Some(query) = text(row, "query") else {
                tracing::warn!("Skipping query row without query text: {:?}", row);
                return None;
            };
            let position = lenient_f64(row.get("position"));
            let rank_bucket = row
                .get("rank_bucket")
                .and_then(Value::as_str)
                .and_then(RankBucket::parse)
                .or_else(|| position.map(RankBucket::from_position));

            Some(QueryMetric {
                query,
                clicks: count(row, "clicks"),
                impressions: count(row, "impressions"),
                position,
                prev_clicks: lenient_u64(row.get("prev_clicks")),
                prev_position: lenient_f64(row.get("prev_position")),
                rank_bucket,
            })
        })
        .collect()
}

/// Totals and bucket counts; the best query is the one with most clicks,
/// ties broken by impressions.
pub fn summarize_keywords(metrics: &[QueryMetric]) -> KeywordSummary {
    let mut summary = KeywordSummary {
        keyword_count: metrics.len() as u64,
        ..KeywordSummary::default()
    };

    for metric in metrics {
        summary.total_clicks += metric.clicks;
        summary.total_impressions += metric.impressions;
        if let Some(bucket) = metric.rank_bucket {
            summary.ranks.add(bucket, 1);
        }
    }

    summary.best_query = metrics
        .iter()
        .filter(|m| m.clicks > 0 || m.impressions > 0)
        .max_by(|a, b| {
            a.clicks
                .cmp(&b.clicks)
                .then(a.impressions.cmp(&b.impressions))
                .then(b.query.cmp(&a.query))
        })
        .map(|m| m.query.clone());

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_rows_accepts_envelopes() {
        assert_eq!(extract_rows(json!([{"page": "a"}])).unwrap().len(), 1);
        assert_eq!(extract_rows(json!({"data": [{"page": "a"}, {"page": "b"}]})).unwrap().len(), 2);
        assert_eq!(extract_rows(json!({"rows": []})).unwrap().len(), 0);
        assert_eq!(extract_rows(json!({"results": [1, {"page": "a"}]})).unwrap().len(), 1);
        assert!(extract_rows(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_extract_rows_surfaces_error_object() {
        let err = extract_rows(json!({"error": {"message": "Syntax error at [3:1]"}})).unwrap_err();
        assert!(err.to_string().contains("Syntax error at [3:1]"));

        let err = extract_rows(json!({"error": "quota exceeded"})).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_extract_rows_rejects_unknown_shape() {
        assert!(extract_rows(json!({"count": 3})).is_err());
        assert!(extract_rows(json!("rows")).is_err());
    }

    #[test]
    fn test_lenient_numbers() {
        assert_eq!(lenient_u64(Some(&json!("42"))), Some(42));
        assert_eq!(lenient_u64(Some(&json!(41.6))), Some(42));
        assert_eq!(lenient_u64(Some(&json!(null))), None);
        assert_eq!(lenient_f64(Some(&json!("3.25"))), Some(3.25));
        assert_eq!(lenient_f64(Some(&json!("n/a"))), None);
        assert_eq!(lenient_f64(None), None);
    }

    #[test]
    fn test_page_summaries_skip_rows_without_page() {
        let rows = extract_rows(json!([
            {
                "page": "https://example.com/a",
                "best_query": "rust csv",
                "best_query_clicks": "12",
                "best_query_position": 2.4,
                "total_clicks": 30,
                "prev_total_clicks": null,
                "keyword_count": 4,
                "rank_top3": 1,
                "rank_first_page": "2",
                "rank_beyond": 1
            },
            {"best_query": "orphan"}
        ]))
        .unwrap();

        let pages = page_summaries(&rows);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].best_query_clicks, 12);
        assert_eq!(pages[0].prev_total_clicks, None);
        assert_eq!(pages[0].ranks.first_page, 2);
        assert_eq!(pages[0].ranks.total(), 4);
    }

    #[test]
    fn test_query_metrics_derive_bucket_from_position() {
        let rows = extract_rows(json!([
            {"query": "a", "clicks": 5, "impressions": 50, "position": 12.0},
            {"query": "b", "clicks": 9, "impressions": 20, "position": 2.0, "rank_bucket": "top3"},
            {"clicks": 1}
        ]))
        .unwrap();

        let metrics = query_metrics(&rows);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].rank_bucket, Some(RankBucket::SecondPage));
        assert_eq!(metrics[1].rank_bucket, Some(RankBucket::Top3));
    }

    #[test]
    fn test_summarize_keywords_picks_best_query() {
        let metric = |query: &str, clicks: u64, impressions: u64, position: f64| QueryMetric {
            query: query.to_string(),
            clicks,
            impressions,
            position: Some(position),
            prev_clicks: None,
            prev_position: None,
            rank_bucket: Some(RankBucket::from_position(position)),
        };
        let summary = summarize_keywords(&[
            metric("alpha", 10, 100, 4.0),
            metric("beta", 10, 300, 8.0),
            metric("gamma", 2, 900, 25.0),
        ]);

        assert_eq!(summary.best_query.as_deref(), Some("beta"));
        assert_eq!(summary.total_clicks, 22);
        assert_eq!(summary.ranks.first_page, 2);
        assert_eq!(summary.ranks.beyond, 1);
        assert_eq!(summary.keyword_count, 3);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize_keywords(&[]);
        assert_eq!(summary.best_query, None);
        assert_eq!(summary.keyword_count, 0);
    }
}
