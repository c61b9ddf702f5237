//! OpenAI-compatible `/embeddings` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Embedder, check_dimension, error_for_status, map_send_error};
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;
use crate::utils::{RetryPolicy, with_retry};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    retry: RetryPolicy,
}

impl OpenAiEmbedder {
    pub fn new(
        config: &EmbeddingConfig,
        api_key: String,
        retry: RetryPolicy,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key,
            model: config.model().to_string(),
            dimension: config.dimension() as usize,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            encoding_format: "float",
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        let response: EmbeddingResponse = error_for_status(response)
            .await?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        response
            .data
            .into_iter()
            .find(|d| d.index == 0)
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let values = with_retry(&self.retry, "openai embed", || self.request(text)).await?;
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
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder(server: &MockServer, dimension: u32) -> OpenAiEmbedder {
        let config = EmbeddingConfig {
            base_url: Some(format!("{}/v1/", server.uri())),
            dimension: Some(dimension),
            ..Default::default()
        };
        OpenAiEmbedder::new(&config, "sk-test".to_string(), RetryPolicy::none()).unwrap()
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            base_url: Some("http://localhost:8080/v1/".to_string()),
            ..Default::default()
        };
        let client = OpenAiEmbedder::new(&config, "k".to_string(), RetryPolicy::none()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
        assert_eq!(client.model_name(), "text-embedding-3-small");
        assert_eq!(client.dimension(), 1536);
    }

    #[tokio::test]
    async fn test_embed_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "text-embedding-3-small",
                "input": "Great lecturer.",
                "encoding_format": "float"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [{"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]}],
                "model": "text-embedding-3-small",
                "usage": {"prompt_tokens": 3, "total_tokens": 3}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let values = embedder(&server, 3).embed("Great lecturer.").await.unwrap();
        assert_eq!(values, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_dimension_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [0.1, 0.2]}]
            })))
            .mount(&server)
            .await;

        let err = embedder(&server, 1536).embed("text").await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 1536,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_embed_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = embedder(&server, 3).embed("text").await.unwrap_err();
        match err {
            EmbeddingError::ServerError { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid api key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embed_empty_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let err = embedder(&server, 3).embed("text").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_embed_retries_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [1.0, 0.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            base_url: Some(format!("{}/v1", server.uri())),
            dimension: Some(3),
            ..Default::default()
        };
        let retry = RetryPolicy::new(3).with_initial_delay(Duration::from_millis(5));
        let client = OpenAiEmbedder::new(&config, "sk-test".to_string(), retry).unwrap();

        let values = client.embed("text").await.unwrap();
        assert_eq!(values, vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_default_retry_settings_abort_on_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(1)
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            base_url: Some(format!("{}/v1", server.uri())),
            dimension: Some(3),
            ..Default::default()
        };
        let retry = crate::models::RetrySettings::default().policy();
        let client = OpenAiEmbedder::new(&config, "sk-test".to_string(), retry).unwrap();

        let err = client.embed("text").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ServerError { status: 429, .. }));
    }
}
