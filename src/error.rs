//! Error types for the review ingestion CLI.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("missing API key: set the {0} environment variable")]
    MissingApiKey(&'static str),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors related to reading the review source file.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("review parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding service: {0}")]
    ConnectionError(String),

    #[error("embedding service error: status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            EmbeddingError::ServerError { status, .. } => is_transient_status(*status),
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::InvalidResponse(_) | EmbeddingError::DimensionMismatch { .. } => false,
        }
    }
}

/// Errors related to vector index operations.
#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("failed to connect to vector index: {0}")]
    ConnectionError(String),

    #[error("index API error: status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("index error: {0}")]
    IndexError(String),

    #[error("index {name} is not ready after {waited_secs}s")]
    NotReady { name: String, waited_secs: u64 },

    #[error("invalid index response: {0}")]
    InvalidResponse(String),

    #[error("index dimension mismatch: index has {index}, vector has {vector}")]
    DimensionMismatch { index: usize, vector: usize },
}

impl Retryable for VectorIndexError {
    fn is_retryable(&self) -> bool {
        match self {
            VectorIndexError::ConnectionError(_) => true,
            VectorIndexError::ApiError { status, .. } => is_transient_status(*status),
            VectorIndexError::IndexError(_)
            | VectorIndexError::NotReady { .. }
            | VectorIndexError::InvalidResponse(_)
            | VectorIndexError::DimensionMismatch { .. } => false,
        }
    }
}

/// Errors related to the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to embed review for {professor}: {source}")]
    Embedding {
        professor: String,
        #[source]
        source: EmbeddingError,
    },

    #[error("vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),
}

/// Errors related to the retrieval-augmented assistant.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("chat service error: status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("invalid chat stream event: {0}")]
    InvalidEvent(String),

    #[error("chat stream error: {0}")]
    Stream(String),

    #[error("conversation must end with a user message")]
    NoUserMessage,

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

impl Retryable for ChatError {
    fn is_retryable(&self) -> bool {
        match self {
            ChatError::RequestError(e) => e.is_timeout() || e.is_connect(),
            ChatError::ServerError { status, .. } => is_transient_status(*status),
            _ => false,
        }
    }
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("chat error: {0}")]
    Chat(#[from] ChatError),
}

/// Rate limits and gateway failures are worth another attempt.
fn is_transient_status(status: u16) -> bool {
    status == 429 || matches!(status, 500 | 502 | 503 | 504)
}
