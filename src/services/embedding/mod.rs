//! Embedding providers.
//!
//! Each provider turns one piece of text into one vector per request. The
//! returned vector length is checked against the configured dimension so a
//! model/index mismatch fails before anything is written to the index.

mod gemini;
mod openai;

pub use gemini::GeminiEmbedder;
pub use openai::OpenAiEmbedder;

use async_trait::async_trait;

use crate::error::{AppError, EmbeddingError};
use crate::models::{Config, EmbeddingProvider, require_env};

/// Text-to-vector client.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Model identifier sent to the provider.
    fn model_name(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;
}

/// Build the embedder selected by `config.embedding.provider`.
///
/// The API key is read from the provider's environment variable.
pub fn create_embedder(config: &Config) -> Result<Box<dyn Embedder>, AppError> {
    let provider = config.embedding.provider;
    let api_key = require_env(provider.api_key_var())?;
    let retry = config.retry.policy();

    let embedder: Box<dyn Embedder> = match provider {
        EmbeddingProvider::OpenAi => {
            Box::new(OpenAiEmbedder::new(&config.embedding, api_key, retry)?)
        }
        EmbeddingProvider::Gemini => {
            Box::new(GeminiEmbedder::new(&config.embedding, api_key, retry)?)
        }
    };

    tracing::debug!(
        provider = %provider,
        model = embedder.model_name(),
        dimension = embedder.dimension(),
        "embedder ready"
    );
    Ok(embedder)
}

pub(crate) fn check_dimension(values: Vec<f32>, expected: usize) -> Result<Vec<f32>, EmbeddingError> {
    if values.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}

pub(crate) fn map_send_error(e: reqwest::Error) -> EmbeddingError {
    if e.is_timeout() {
        EmbeddingError::Timeout
    } else if e.is_connect() {
        EmbeddingError::ConnectionError(e.to_string())
    } else {
        EmbeddingError::RequestError(e)
    }
}

pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, EmbeddingError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(EmbeddingError::ServerError { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dimension() {
        assert!(check_dimension(vec![0.0; 4], 4).is_ok());

        let err = check_dimension(vec![0.0; 3], 4).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }
}
