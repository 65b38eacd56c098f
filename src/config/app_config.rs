use serde::Deserialize;

use crate::domain::{DomainError, Policy, ScoringConfig};
use crate::infrastructure::controller::RetrievalConfig;
use crate::infrastructure::embedding::DEFAULT_EMBEDDING_MODEL;
use crate::infrastructure::llm::DEFAULT_OPENAI_BASE_URL;
use crate::infrastructure::retry::IoConfig;

/// Application configuration
///
/// Every section is optional; a missing section takes its defaults. The
/// `policy` section is validated while deserializing, so an invalid policy
/// fails the load.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub io: IoConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Chat and embedding backends, and which LLM collaborators to enable
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Consult the LLM relevance judge on each pass
    #[serde(default = "default_true")]
    pub llm_judge: bool,
    /// Reformulate with the LLM; keyword expansion otherwise
    #[serde(default = "default_true")]
    pub llm_reformulator: bool,
    /// Generate an answer from the accepted context
    #[serde(default = "default_true")]
    pub generate_answers: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Falls back to `OPENAI_API_KEY` when unset
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// HTTP timeout for provider requests, answer generation included
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Development index
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// JSON array of pre-chunked passages
    pub path: String,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            llm_judge: true,
            llm_reformulator: true,
            generate_answers: true,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl OpenAiConfig {
    /// Configured key, else the `OPENAI_API_KEY` environment variable
    pub fn resolve_api_key(&self) -> Result<String, DomainError> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DomainError::configuration(
                    "OpenAI API key missing: set providers.openai.api_key or OPENAI_API_KEY",
                )
            })
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: "data/index.json".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check the sections that are not validated while deserializing
    pub fn validate(&self) -> Result<(), DomainError> {
        self.retrieval.validate()?;
        self.scoring.validate()?;
        self.io.validate()
    }
}
