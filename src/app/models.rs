use crate::adapters::{OpenAiModel, VertexModel, VertexSettings};
use crate::config::settings::{LlmSettings, KNOWN_PROVIDERS};
use crate::domain::ports::LanguageModel;
use crate::utils::error::{LensError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Configured LLM backends keyed by provider name.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    default_provider: String,
    models: BTreeMap<String, Arc<dyn LanguageModel>>,
}

impl ModelRegistry {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            default_provider: default_provider.into(),
            models: BTreeMap::new(),
        }
    }

    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.models.insert(model.name().to_string(), model);
        self
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_seconds);
        let mut registry = Self::new(settings.provider.clone());

        if let Some(openai) = &settings.openai {
            let mut model = OpenAiModel::new(openai.api_key.clone(), openai.model.clone(), timeout)?;
            if let Some(base_url) = &openai.base_url {
                model = model.with_base_url(base_url.clone());
            }
            tracing::info!("OpenAI model configured: {}", model.model());
            registry = registry.with_model(Arc::new(model));
        }

        if let Some(vertex) = &settings.vertex {
            let model = VertexModel::new(
                VertexSettings {
                    project: vertex.project.clone(),
                    location: vertex.location.clone(),
                    model: vertex.model.clone(),
                    access_token: vertex.access_token.clone(),
                    base_url: vertex.base_url.clone(),
                },
                timeout,
            )?;
            tracing::info!("Vertex model configured: {}", vertex.model);
            registry = registry.with_model(Arc::new(model));
        }

        if registry.models.is_empty() {
            tracing::warn!("No LLM provider configured; only search endpoints will work");
        }
        Ok(registry)
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn providers(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    /// Request override first, then the configured default.
    pub fn select(&self, requested: Option<&str>) -> Result<Arc<dyn LanguageModel>> {
        let name = requested
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| self.default_provider.clone());

        if !KNOWN_PROVIDERS.contains(&name.as_str()) {
            return Err(LensError::validation(format!(
                "unknown provider '{}', expected one of: {}",
                name,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        self.models.get(&name).cloned().ok_or_else(|| {
            LensError::validation(format!("provider '{}' is not configured", name))
        })
    }
}
