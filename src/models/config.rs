use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::format::OutputFormat;
use crate::error::ConfigError;
use crate::utils::RetryPolicy;

pub const PINECONE_API_KEY_VAR: &str = "PINECONE_API_KEY";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

pub const DEFAULT_INDEX_NAME: &str = "rag";
pub const DEFAULT_NAMESPACE: &str = "ns1";
pub const DEFAULT_PINECONE_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prof-rag").join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.dimension() == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }
        if self.index.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "index.name cannot be empty".to_string(),
            ));
        }
        if self.index.upsert_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "index.upsert_batch_size must be at least 1".to_string(),
            ));
        }
        if self.chat.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "chat.top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read a required secret from the environment.
pub fn require_env(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingApiKey(var))
}

/// Which embedding API the reviews are sent to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    OpenAi,
    Gemini,
}

impl EmbeddingProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            EmbeddingProvider::OpenAi => "text-embedding-3-small",
            EmbeddingProvider::Gemini => "text-embedding-004",
        }
    }

    pub fn default_dimension(self) -> u32 {
        match self {
            EmbeddingProvider::OpenAi => 1536,
            EmbeddingProvider::Gemini => 768,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            EmbeddingProvider::OpenAi => DEFAULT_OPENAI_URL,
            EmbeddingProvider::Gemini => DEFAULT_GEMINI_URL,
        }
    }

    pub fn api_key_var(self) -> &'static str {
        match self {
            EmbeddingProvider::OpenAi => OPENAI_API_KEY_VAR,
            EmbeddingProvider::Gemini => GEMINI_API_KEY_VAR,
        }
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAi),
            "gemini" | "google" => Ok(EmbeddingProvider::Gemini),
            _ => Err(format!("unknown embedding provider: {s}")),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAi => write!(f, "openai"),
            EmbeddingProvider::Gemini => write!(f, "gemini"),
        }
    }
}

/// Model, dimension and endpoint fall back to the provider's defaults when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_timeout() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: None,
            dimension: None,
            base_url: None,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl EmbeddingConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
            .unwrap_or_else(|| self.provider.default_dimension())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }
}

/// Where vectors are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexDriver {
    #[default]
    Pinecone,
    /// Process-local index, nothing leaves the machine.
    Memory,
}

impl std::fmt::Display for IndexDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexDriver::Pinecone => write!(f, "pinecone"),
            IndexDriver::Memory => write!(f, "memory"),
        }
    }
}

/// Distance metric declared when the index is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Cosine => write!(f, "cosine"),
            Metric::Euclidean => write!(f, "euclidean"),
            Metric::DotProduct => write!(f, "dotproduct"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub driver: IndexDriver,

    #[serde(default = "default_index_name")]
    pub name: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub metric: Metric,

    #[serde(default = "default_cloud")]
    pub cloud: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_control_plane_url")]
    pub control_plane_url: String,

    /// Data-plane host. Looked up from the control plane when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,

    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,

    #[serde(default = "default_index_timeout")]
    pub timeout_secs: u64,
}

fn default_index_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_control_plane_url() -> String {
    DEFAULT_PINECONE_URL.to_string()
}

fn default_ready_timeout() -> u64 {
    120
}

// Pinecone caps a single upsert request at 1000 vectors.
fn default_upsert_batch_size() -> usize {
    1000
}

fn default_index_timeout() -> u64 {
    30
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            driver: IndexDriver::default(),
            name: default_index_name(),
            namespace: default_namespace(),
            metric: Metric::default(),
            cloud: default_cloud(),
            region: default_region(),
            control_plane_url: default_control_plane_url(),
            host: None,
            ready_timeout_secs: default_ready_timeout(),
            upsert_batch_size: default_upsert_batch_size(),
            timeout_secs: default_index_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_chat_url")]
    pub base_url: String,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_chat_url() -> String {
    DEFAULT_OPENAI_URL.to_string()
}

fn default_top_k() -> u32 {
    3
}

fn default_chat_timeout() -> u64 {
    120
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            base_url: default_chat_url(),
            top_k: default_top_k(),
            timeout_secs: default_chat_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts per remote call. `1` means any failure aborts the run.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_delay_ms() -> u64 {
    500
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
            .with_initial_delay(std::time::Duration::from_millis(self.initial_delay_ms))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: OutputFormat,
}
