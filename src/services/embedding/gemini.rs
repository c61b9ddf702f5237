//! Gemini `models/{model}:embedContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Embedder, check_dimension, error_for_status, map_send_error};
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;
use crate::utils::{RetryPolicy, with_retry};

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    retry: RetryPolicy,
}

impl GeminiEmbedder {
    pub fn new(
        config: &EmbeddingConfig,
        api_key: String,
        retry: RetryPolicy,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        // Accept both "text-embedding-004" and "models/text-embedding-004".
        let model = config
            .model()
            .trim_start_matches("models/")
            .to_string();

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key,
            model,
            dimension: config.dimension() as usize,
            retry,
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/models/{}:embedContent", self.base_url, self.model);
        let request = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: [Part { text }],
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        let response: EmbedContentResponse = error_for_status(response)
            .await?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(response.embedding.values)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let values = with_retry(&self.retry, "gemini embed", || self.request(text)).await?;
        check_dimension(values, self.dimension)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmbeddingProvider;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder(server: &MockServer, dimension: u32) -> GeminiEmbedder {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Gemini,
            base_url: Some(server.uri()),
            dimension: Some(dimension),
            ..Default::default()
        };
        GeminiEmbedder::new(&config, "g-test".to_string(), RetryPolicy::none()).unwrap()
    }

    #[test]
    fn test_model_prefix_stripped() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Gemini,
            model: Some("models/text-embedding-004".to_string()),
            ..Default::default()
        };
        let client = GeminiEmbedder::new(&config, "k".to_string(), RetryPolicy::none()).unwrap();
        assert_eq!(client.model_name(), "text-embedding-004");
        assert_eq!(client.dimension(), 768);
    }

    #[tokio::test]
    async fn test_embed_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .and(header("x-goog-api-key", "g-test"))
            .and(body_json(json!({
                "model": "models/text-embedding-004",
                "content": {"parts": [{"text": "Helpful office hours."}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embedding": {"values": [0.5, -0.5]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let values = embedder(&server, 2)
            .embed("Helpful office hours.")
            .await
            .unwrap();
        assert_eq!(values, vec![0.5, -0.5]);
    }

    #[tokio::test]
    async fn test_embed_dimension_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embedding": {"values": [0.5, -0.5, 0.1]}
            })))
            .mount(&server)
            .await;

        let err = embedder(&server, 768).embed("text").await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 768,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": []})))
            .mount(&server)
            .await;

        let err = embedder(&server, 2).embed("text").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }
}
