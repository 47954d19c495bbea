use crate::adapters::openai::upstream_message;
use crate::domain::model::GenerationRequest;
use crate::domain::ports::LanguageModel;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct VertexSettings {
    pub project: String,
    pub location: String,
    pub model: String,
    pub access_token: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini on Vertex AI through the `generateContent` REST method.
#[derive(Clone)]
pub struct VertexModel {
    http_client: Client,
    endpoint: String,
    access_token: String,
}

impl VertexModel {
    pub fn new(settings: VertexSettings, timeout: Duration) -> Result<Self> {
        let base = settings
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", settings.location));
        let endpoint = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            base.trim_end_matches('/'),
            settings.project,
            settings.location,
            settings.model
        );

        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            endpoint,
            access_token: settings.access_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LanguageModel for VertexModel {
    fn name(&self) -> &str {
        "vertex"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": { "temperature": request.temperature },
        });
        if let Some(system) = &request.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        if let Some(max_tokens) = request.max_tokens {
            body["generationConfig"]["maxOutputTokens"] = json!(max_tokens);
        }

        tracing::debug!(endpoint = %self.endpoint, "Calling Vertex generateContent");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!("Vertex request failed with {}: {}", status, text);
            return Err(LensError::upstream("vertex", status.as_u16(), upstream_message(&text)));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LensError::extraction("completion", "Vertex returned no candidate text"));
        }
        Ok(text)
    }
}
