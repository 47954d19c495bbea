use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::NaiveDate;
use httpmock::prelude::*;
use repost_lens::{create_router, Analyzer, AppState, HttpQueryService, ModelRegistry, OpenAiModel};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const ANALYSIS_REPLY: &str = "## Search Intent\nBuyers comparing tools.\n\n## Priority Keywords\n- seo audit tool\n- site audit\n\n## Recommended Strategy\nStrategy: REPOST\n\n## Action Plan\n1. Refresh the comparison table";

fn test_server(mock: &MockServer) -> TestServer {
    let query = HttpQueryService::new(mock.url("/query"), None, Duration::from_secs(5)).unwrap();
    let model = OpenAiModel::new("sk-test", "gpt-4o-mini", Duration::from_secs(5))
        .unwrap()
        .with_base_url(mock.url("/v1"));
    let analyzer = Analyzer::new(
        Arc::new(query),
        ModelRegistry::new("openai").with_model(Arc::new(model)),
        "gsc.search_analytics",
    )
    .with_today(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());

    TestServer::new(create_router(AppState::new(analyzer))).unwrap()
}

async fn mock_completion<'a>(mock: &'a MockServer, reply: &str) -> httpmock::Mock<'a> {
    let reply = reply.to_string();
    mock.mock_async(move |when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({
            "choices": [{ "message": { "role": "assistant", "content": reply } }]
        }));
    })
    .await
}

#[tokio::test]
async fn test_health_lists_providers() {
    let mock = MockServer::start_async().await;
    let server = test_server(&mock);

    let resp = server.get("/health").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["providers"], json!(["openai"]));
}

#[tokio::test]
async fn test_search_list_normalizes_rows() {
    let mock = MockServer::start_async().await;
    let query_mock = mock
        .mock_async(|when, then| {
            when.method(POST)
                .path("/query")
                .body_contains("ROW_NUMBER()")
                .body_contains("sc-domain:example.com");
            then.status(200).json_body(json!({
                "rows": [{
                    "page": "https://example.com/guide",
                    "best_query": "seo audit",
                    "best_query_clicks": "120",
                    "best_query_impressions": 2400,
                    "best_query_position": 3.4,
                    "total_clicks": 300,
                    "total_impressions": 9000,
                    "keyword_count": 42,
                    "rank_top3": 5,
                    "rank_first_page": 10,
                    "rank_second_page": 12,
                    "rank_beyond": 15
                }]
            }));
        })
        .await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/search/list")
        .json(&json!({ "site": "sc-domain:example.com", "days": 7 }))
        .await;

    query_mock.assert_async().await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["window"]["current_end"], "2024-06-27");
    assert_eq!(body["window"]["current_start"], "2024-06-21");
    assert_eq!(body["rows"][0]["best_query_clicks"], 120);
}

#[tokio::test]
async fn test_search_list_csv_download() {
    let mock = MockServer::start_async().await;
    mock.mock_async(|when, then| {
        when.method(POST).path("/query");
        then.status(200).json_body(json!([
            { "page": "https://example.com/guide", "best_query": "seo audit", "total_clicks": 12 }
        ]));
    })
    .await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/search/list")
        .json(&json!({ "site": "sc-domain:example.com", "format": "csv" }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    assert!(resp
        .header("content-type")
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let body = resp.text();
    assert!(body.lines().next().unwrap().starts_with("page,"));
    assert!(body.contains("https://example.com/guide"));
}

#[tokio::test]
async fn test_search_by_url_passes_upstream_error() {
    let mock = MockServer::start_async().await;
    mock.mock_async(|when, then| {
        when.method(POST).path("/query");
        then.status(403).body("Access Denied: Table gsc.search_analytics");
    })
    .await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/search/by-url")
        .json(&json!({ "page": "https://example.com/guide" }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Access Denied"));
}

#[tokio::test]
async fn test_search_sql_is_a_dry_run() {
    let mock = MockServer::start_async().await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/search/sql")
        .json(&json!({
            "kind": "by_url",
            "page": "https://example.com/it's",
            "start_date": "2024-05-01",
            "end_date": "2024-05-28"
        }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let sql = resp.json::<Value>()["sql"].as_str().unwrap().to_string();
    assert!(sql.contains("'https://example.com/it''s'"));
    assert!(sql.contains("2024-05-01"));
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let mock = MockServer::start_async().await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/search/list")
        .json(&json!({ "limit": 10 }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_analyze_with_supplied_metrics() {
    let mock = MockServer::start_async().await;
    let completion = mock_completion(&mock, ANALYSIS_REPLY).await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/optimize/analyze")
        .json(&json!({
            "page": "https://example.com/guide",
            "article_text": "Our guide to SEO audits.",
            "metrics": [
                { "query": "seo audit tool", "clicks": 30, "impressions": 800, "position": 4.2,
                  "prev_clicks": null, "prev_position": null, "rank_bucket": "first_page" }
            ]
        }))
        .await;

    completion.assert_async().await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["analysis"]["strategy"], "REPOST");
    assert_eq!(body["analysis"]["priority_keywords"], json!(["seo audit tool", "site audit"]));
    assert_eq!(body["summary"]["best_query"], "seo audit tool");
}

#[tokio::test]
async fn test_analyze_accepts_partial_metrics() {
    let mock = MockServer::start_async().await;
    mock_completion(&mock, ANALYSIS_REPLY).await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/optimize/analyze")
        .json(&json!({
            "page": "https://example.com/guide",
            "metrics": [
                { "query": "seo audit", "clicks": 3 },
                { "query": "site audit" }
            ]
        }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["summary"]["total_clicks"], 3);
    assert_eq!(body["summary"]["total_impressions"], 0);
    assert_eq!(body["summary"]["best_query"], "seo audit");
}

#[tokio::test]
async fn test_search_out_of_range_date_uses_error_envelope() {
    let mock = MockServer::start_async().await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/search/by-url")
        .json(&json!({ "page": "https://example.com/guide", "start_date": "+262142-12-31" }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("out of range"));
}

#[tokio::test]
async fn test_analyze_unknown_provider_is_bad_request() {
    let mock = MockServer::start_async().await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/optimize/analyze")
        .json(&json!({ "page": "https://example.com/guide", "metrics": [], "provider": "vertex" }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_rejects_more_than_ten_items() {
    let mock = MockServer::start_async().await;
    let server = test_server(&mock);

    let items: Vec<Value> = (0..11)
        .map(|i| json!({ "page": format!("https://example.com/{}", i) }))
        .collect();
    let resp = server
        .post("/api/optimize/batch")
        .json(&json!({ "items": items }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_batch_reports_each_item() {
    let mock = MockServer::start_async().await;
    mock.mock_async(|when, then| {
        when.method(POST).path("/query");
        then.status(200).json_body(json!([
            { "page": "https://example.com/a", "query": "rust", "clicks": 3, "impressions": 40, "position": 12.0 }
        ]));
    })
    .await;
    mock_completion(&mock, ANALYSIS_REPLY).await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/optimize/batch")
        .json(&json!({ "items": [
            { "page": "https://example.com/a" },
            { "page": "" }
        ] }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["results"][0]["success"], true);
    assert_eq!(body["results"][0]["data"]["analysis"]["strategy"], "REPOST");
    assert_eq!(body["results"][1]["success"], false);
}

#[tokio::test]
async fn test_outline_returns_sections() {
    let mock = MockServer::start_async().await;
    mock_completion(&mock, "## Why audits matter\n### Traffic loss\n## Choosing a tool\n- Pricing").await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/report/outline")
        .json(&json!({ "page": "https://example.com/guide", "metrics": [] }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["outline"][0]["heading"], "Why audits matter");
    assert_eq!(body["outline"][1]["subheadings"], json!(["Pricing"]));
}

#[tokio::test]
async fn test_email_renders_html() {
    let mock = MockServer::start_async().await;
    mock_completion(&mock, "Subject: Guide refresh plan\n\n- Update the **table**\n- <script>x</script>").await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/report/email")
        .json(&json!({ "page": "https://example.com/guide", "analysis": ANALYSIS_REPLY }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["subject"], "Guide refresh plan");
    let html = body["html"].as_str().unwrap();
    assert!(html.contains("<strong>table</strong>"));
    assert!(!html.contains("<script>"));
}

#[tokio::test]
async fn test_export_returns_zip_attachment() {
    let mock = MockServer::start_async().await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/report/export")
        .json(&json!({
            "page": "https://example.com/guide",
            "analysis_text": ANALYSIS_REPLY,
            "metrics": [
                { "query": "seo audit", "clicks": 5, "impressions": 50, "position": 2.0,
                  "prev_clicks": 4, "prev_position": 3.0, "rank_bucket": "top3" }
            ]
        }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.header("content-type"), "application/zip");
    assert!(resp
        .header("content-disposition")
        .to_str()
        .unwrap()
        .contains("attachment"));

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(resp.as_bytes().to_vec())).unwrap();
    let mut csv = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("keywords.csv").unwrap(), &mut csv).unwrap();
    assert!(csv.contains("seo audit"));
}

#[tokio::test]
async fn test_context_vectors_filters_invalid_suggestions() {
    let mock = MockServer::start_async().await;
    let reply = r#"```json
{"suggestions":[
  {"paragraph_index":0,"position":"after","content":"Compare pricing tiers.","target_keyword":"seo audit tool"},
  {"paragraph_index":9,"position":"after","content":"Out of range."}
]}
```"#;
    mock_completion(&mock, reply).await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/write/context-vectors")
        .json(&json!({
            "page": "https://example.com/guide",
            "paragraphs": ["Intro.", "Body."],
            "keywords": ["seo audit tool"]
        }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 1);
    assert_eq!(body["suggestions"][0]["position"], "after");
}

#[tokio::test]
async fn test_paragraph_review_fans_out() {
    let mock = MockServer::start_async().await;
    mock_completion(&mock, "## Assessment\nToo vague.\n\n## Rewrite\nA sharper paragraph.").await;
    let server = test_server(&mock);

    let resp = server
        .post("/api/write/paragraphs")
        .json(&json!({ "paragraphs": ["One.", "Two."], "keywords": ["seo"] }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1]["index"], 1);
    assert_eq!(results[1]["review"]["rewrite"], "A sharper paragraph.");
}
