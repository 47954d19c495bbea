use crate::domain::ports::QueryService;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// SQL-over-HTTP client: POSTs `{"query": sql}` and hands back the JSON body.
#[derive(Debug, Clone)]
pub struct HttpQueryService {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpQueryService {
    pub fn new(endpoint: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn execute(&self, sql: &str) -> Result<serde_json::Value> {
        tracing::debug!("Sending query to {} ({} bytes of SQL)", self.endpoint, sql.len());

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": sql }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Query service response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Query service failed with {}: {}", status, body);
            return Err(LensError::upstream("query", status.as_u16(), body));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_execute_posts_sql_with_token() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/query")
                    .header("authorization", "Bearer secret")
                    .json_body(serde_json::json!({ "query": "SELECT 1" }));
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(serde_json::json!([{ "one": 1 }]));
            })
            .await;

        let service = HttpQueryService::new(
            server.url("/query"),
            Some("secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        let value = service.execute("SELECT 1").await.unwrap();

        api_mock.assert_async().await;
        assert_eq!(value[0]["one"], 1);
    }

    #[tokio::test]
    async fn test_execute_surfaces_upstream_error_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/query");
                then.status(400).body("Unrecognized name: clickz");
            })
            .await;

        let service = HttpQueryService::new(server.url("/query"), None, Duration::from_secs(5)).unwrap();
        let err = service.execute("SELECT clickz").await.unwrap_err();

        match err {
            LensError::UpstreamError { status, message, .. } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unrecognized name: clickz");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
