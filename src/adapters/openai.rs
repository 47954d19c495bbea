use crate::domain::model::GenerationRequest;
use crate::domain::ports::LanguageModel;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Chat completions client for OpenAI and compatible endpoints.
#[derive(Clone)]
pub struct OpenAiModel {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Prefer the API's own error message over the raw body.
pub(crate) fn upstream_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(model = %self.model, prompt_chars = request.prompt.len(), "Calling OpenAI chat completion");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI request failed with {}: {}", status, text);
            return Err(LensError::upstream("openai", status.as_u16(), upstream_message(&text)));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LensError::extraction("completion", "OpenAI returned no message content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_generate_returns_first_choice() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .body_contains("\"model\":\"gpt-4o-mini\"")
                    .body_contains("\"role\":\"system\"");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": "Strategy: REPOST" } }]
                }));
            })
            .await;

        let model = OpenAiModel::new("sk-test", "gpt-4o-mini", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.url("/v1/"));
        let text = model
            .generate(&GenerationRequest::new("system", "prompt"))
            .await
            .unwrap();

        api_mock.assert_async().await;
        assert_eq!(text, "Strategy: REPOST");
    }

    #[tokio::test]
    async fn test_generate_maps_api_error_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).json_body(serde_json::json!({
                    "error": { "message": "Rate limit reached", "type": "requests" }
                }));
            })
            .await;

        let model = OpenAiModel::new("sk-test", "gpt-4o-mini", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.base_url());
        let err = model
            .generate(&GenerationRequest::new("system", "prompt"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "openai service returned 429: Rate limit reached");
    }

    #[test]
    fn test_upstream_message_falls_back_to_body() {
        assert_eq!(upstream_message("gateway timeout"), "gateway timeout");
    }
}
