use crate::core::fanout::MAX_FANOUT;
use crate::core::prompts::DEFAULT_MAX_ARTICLE_CHARS;
use crate::core::sql::sql_identifier;
use crate::utils::error::{LensError, Result};
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

pub const KNOWN_PROVIDERS: [&str; 2] = ["openai", "vertex"];

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub query: QuerySettings,
    pub llm: LlmSettings,
    pub batch: BatchSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub endpoint: String,
    pub token: Option<String>,
    pub table: String,
    pub timeout_seconds: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: None,
            table: "gsc.search_analytics".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexConfig {
    pub project: String,
    #[serde(default = "default_vertex_location")]
    pub location: String,
    #[serde(default = "default_vertex_model")]
    pub model: String,
    pub access_token: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_vertex_location() -> String {
    "us-central1".to_string()
}

fn default_vertex_model() -> String {
    "gemini-1.5-pro".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: String,
    pub timeout_seconds: u64,
    pub max_article_chars: usize,
    pub openai: Option<OpenAiSettings>,
    pub vertex: Option<VertexConfig>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            timeout_seconds: 120,
            max_article_chars: DEFAULT_MAX_ARTICLE_CHARS,
            openai: None,
            vertex: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub concurrency: usize,
    pub output_path: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrency: 5,
            output_path: "./output".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Self::from_toml_str(&content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content, |name| std::env::var(name).ok());
        Ok(toml::from_str(&processed)?)
    }

    /// Replace `${VAR}` placeholders; unknown variables are left as written.
    pub fn substitute_env_vars(content: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
        ENV_PLACEHOLDER
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Environment variables win over the settings file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("REPOSTLENS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("REPOSTLENS_PORT") {
            self.server.port = port.parse().map_err(|_| LensError::InvalidConfigValueError {
                field: "REPOSTLENS_PORT".to_string(),
                value: port.clone(),
                reason: "not a port number".to_string(),
            })?;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.server.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            };
        }

        if let Some(endpoint) = lookup("QUERY_API_URL") {
            self.query.endpoint = endpoint;
        }
        if let Some(token) = lookup("QUERY_API_TOKEN") {
            self.query.token = Some(token);
        }
        if let Some(table) = lookup("GSC_TABLE") {
            self.query.table = table;
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider.to_lowercase();
        }

        if let Some(api_key) = lookup("OPENAI_API_KEY") {
            let openai = self.llm.openai.get_or_insert_with(|| OpenAiSettings {
                api_key: String::new(),
                base_url: None,
                model: default_openai_model(),
            });
            openai.api_key = api_key;
        }
        if let Some(openai) = self.llm.openai.as_mut() {
            if let Some(base_url) = lookup("OPENAI_BASE_URL") {
                openai.base_url = Some(base_url);
            }
            if let Some(model) = lookup("OPENAI_MODEL") {
                openai.model = model;
            }
        }

        if let (Some(project), Some(access_token)) =
            (lookup("VERTEX_PROJECT"), lookup("VERTEX_ACCESS_TOKEN"))
        {
            let vertex = self.llm.vertex.get_or_insert_with(|| VertexConfig {
                project: String::new(),
                location: default_vertex_location(),
                model: default_vertex_model(),
                access_token: String::new(),
                base_url: None,
            });
            vertex.project = project;
            vertex.access_token = access_token;
        }
        if let Some(vertex) = self.llm.vertex.as_mut() {
            if let Some(location) = lookup("VERTEX_LOCATION") {
                vertex.location = location;
            }
            if let Some(model) = lookup("VERTEX_MODEL") {
                vertex.model = model;
            }
            if let Some(base_url) = lookup("VERTEX_BASE_URL") {
                vertex.base_url = Some(base_url);
            }
        }

        Ok(())
    }

    pub fn configured_providers(&self) -> Vec<&'static str> {
        let mut providers = Vec::new();
        if self.llm.openai.is_some() {
            providers.push("openai");
        }
        if self.llm.vertex.is_some() {
            providers.push("vertex");
        }
        providers
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        if self.query.endpoint.trim().is_empty() {
            return Err(LensError::MissingConfigError {
                field: "query.endpoint (QUERY_API_URL)".to_string(),
            });
        }
        validate_url("query.endpoint", &self.query.endpoint)?;
        sql_identifier(&self.query.table)?;

        if self.server.port == 0 {
            return Err(LensError::InvalidConfigValueError {
                field: "server.port".to_string(),
                value: "0".to_string(),
                reason: "port must be greater than 0".to_string(),
            });
        }

        if !KNOWN_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(LensError::InvalidConfigValueError {
                field: "llm.provider".to_string(),
                value: self.llm.provider.clone(),
                reason: format!("expected one of: {}", KNOWN_PROVIDERS.join(", ")),
            });
        }
        if let Some(openai) = &self.llm.openai {
            if openai.api_key.trim().is_empty() {
                return Err(LensError::MissingConfigError {
                    field: "llm.openai.api_key (OPENAI_API_KEY)".to_string(),
                });
            }
            if let Some(base_url) = &openai.base_url {
                validate_url("llm.openai.base_url", base_url)?;
            }
        }
        if let Some(vertex) = &self.llm.vertex {
            if let Some(base_url) = &vertex.base_url {
                validate_url("llm.vertex.base_url", base_url)?;
            }
        }

        validate_range("batch.concurrency", self.batch.concurrency, 1, MAX_FANOUT)?;
        validate_path("batch.output_path", &self.batch.output_path)?;
        Ok(())
    }
}
