//! Pinecone serverless backend over the REST API.
//!
//! Index management goes to the control plane (`api.pinecone.io`); vector
//! operations go to the per-index host returned by `describe_index`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::{Provisioned, VectorIndex};
use crate::error::VectorIndexError;
use crate::models::{IndexConfig, IndexStats, Metric, QueryMatch, UpsertRecord};
use crate::utils::{RetryPolicy, with_retry};

const API_VERSION: &str = "2024-07";
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: u32,
    metric: Metric,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    dimension: u32,
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [UpsertRecord],
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: u32,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

pub struct PineconeBackend {
    client: Client,
    api_key: String,
    control_plane_url: String,
    name: String,
    namespace: String,
    metric: Metric,
    cloud: String,
    region: String,
    dimension: u32,
    ready_timeout: Duration,
    upsert_batch_size: usize,
    retry: RetryPolicy,
    host: OnceCell<String>,
}

impl PineconeBackend {
    pub fn new(
        config: &IndexConfig,
        dimension: u32,
        api_key: String,
        retry: RetryPolicy,
    ) -> Result<Self, VectorIndexError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))?;

        let host = OnceCell::new();
        if let Some(ref configured) = config.host {
            let _ = host.set(normalize_host(configured));
        }

        Ok(Self {
            client,
            api_key,
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
            name: config.name.clone(),
            namespace: config.namespace.clone(),
            metric: config.metric,
            cloud: config.cloud.clone(),
            region: config.region.clone(),
            dimension,
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
            upsert_batch_size: config.upsert_batch_size.max(1),
            retry,
            host,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, VectorIndexError> {
        self.authorized(request).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                VectorIndexError::ConnectionError(e.to_string())
            } else {
                VectorIndexError::IndexError(e.to_string())
            }
        })
    }

    /// `None` when the index does not exist.
    async fn describe_index(&self) -> Result<Option<IndexDescription>, VectorIndexError> {
        let url = format!("{}/indexes/{}", self.control_plane_url, self.name);
        let response = self.send(self.client.get(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let description = parse_json(error_for_status(response).await?).await?;
        Ok(Some(description))
    }

    async fn create_index(&self) -> Result<Provisioned, VectorIndexError> {
        let url = format!("{}/indexes", self.control_plane_url);
        let request = CreateIndexRequest {
            name: &self.name,
            dimension: self.dimension,
            metric: self.metric,
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &self.cloud,
                    region: &self.region,
                },
            },
        };

        let response = self.send(self.client.post(&url).json(&request)).await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(Provisioned::AlreadyExists);
        }
        error_for_status(response).await?;
        Ok(Provisioned::Created)
    }

    fn check_dimension(&self, description: &IndexDescription) -> Result<(), VectorIndexError> {
        if description.dimension != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                index: description.dimension as usize,
                vector: self.dimension as usize,
            });
        }
        Ok(())
    }

    async fn wait_until_ready(&self) -> Result<IndexDescription, VectorIndexError> {
        let start = Instant::now();

        loop {
            let description = with_retry(&self.retry, "pinecone describe_index", || {
                self.describe_index()
            })
            .await?
            .ok_or_else(|| VectorIndexError::IndexError(format!("index {} vanished", self.name)))?;

            if description.status.ready && !description.host.is_empty() {
                return Ok(description);
            }

            if start.elapsed() >= self.ready_timeout {
                return Err(VectorIndexError::NotReady {
                    name: self.name.clone(),
                    waited_secs: start.elapsed().as_secs(),
                });
            }

            tracing::debug!(
                index = %self.name,
                state = %description.status.state,
                "waiting for index to become ready"
            );
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Data-plane base URL, resolved once from the control plane.
    async fn host(&self) -> Result<&str, VectorIndexError> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let description = with_retry(&self.retry, "pinecone describe_index", || {
                    self.describe_index()
                })
                .await?
                .ok_or_else(|| {
                    VectorIndexError::IndexError(format!("index {} does not exist", self.name))
                })?;
                Ok::<_, VectorIndexError>(normalize_host(&description.host))
            })
            .await?;
        Ok(host.as_str())
    }

    async fn upsert_batch(&self, batch: &[UpsertRecord]) -> Result<u64, VectorIndexError> {
        let url = format!("{}/vectors/upsert", self.host().await?);
        let request = UpsertRequest {
            vectors: batch,
            namespace: &self.namespace,
        };

        let response = self.send(self.client.post(&url).json(&request)).await?;
        let response: UpsertResponse = parse_json(error_for_status(response).await?).await?;
        Ok(response.upserted_count)
    }

    async fn fetch_stats(&self) -> Result<IndexStats, VectorIndexError> {
        let url = format!("{}/describe_index_stats", self.host().await?);
        let response = self
            .send(self.client.post(&url).json(&serde_json::json!({})))
            .await?;
        parse_json(error_for_status(response).await?).await
    }

    async fn run_query(&self, vector: &[f32], top_k: u32) -> Result<Vec<QueryMatch>, VectorIndexError> {
        let url = format!("{}/query", self.host().await?);
        let request = QueryRequest {
            namespace: &self.namespace,
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response = self.send(self.client.post(&url).json(&request)).await?;
        let response: QueryResponse = parse_json(error_for_status(response).await?).await?;
        Ok(response.matches)
    }
}

#[async_trait]
impl VectorIndex for PineconeBackend {
    async fn ensure_index(&self) -> Result<Provisioned, VectorIndexError> {
        let existing = with_retry(&self.retry, "pinecone describe_index", || {
            self.describe_index()
        })
        .await?;

        let provisioned = match existing {
            Some(description) => {
                self.check_dimension(&description)?;
                Provisioned::AlreadyExists
            }
            None => {
                tracing::info!(
                    index = %self.name,
                    dimension = self.dimension,
                    metric = %self.metric,
                    cloud = %self.cloud,
                    region = %self.region,
                    "creating serverless index"
                );
                with_retry(&self.retry, "pinecone create_index", || self.create_index()).await?
            }
        };

        // A concurrent creator may have won with a different dimension.
        let description = self.wait_until_ready().await?;
        self.check_dimension(&description)?;
        let _ = self.host.set(normalize_host(&description.host));
        Ok(provisioned)
    }

    async fn upsert(&self, records: Vec<UpsertRecord>) -> Result<u64, VectorIndexError> {
        if records.is_empty() {
            return Ok(0);
        }

        if let Some(bad) = records
            .iter()
            .find(|r| r.values.len() != self.dimension as usize)
        {
            return Err(VectorIndexError::DimensionMismatch {
                index: self.dimension as usize,
                vector: bad.values.len(),
            });
        }

        let mut written = 0;
        for batch in records.chunks(self.upsert_batch_size) {
            written += with_retry(&self.retry, "pinecone upsert", || self.upsert_batch(batch)).await?;
            tracing::debug!(
                index = %self.name,
                namespace = %self.namespace,
                batch = batch.len(),
                "upserted batch"
            );
        }
        Ok(written)
    }

    async fn describe_stats(&self) -> Result<IndexStats, VectorIndexError> {
        with_retry(&self.retry, "pinecone describe_index_stats", || {
            self.fetch_stats()
        })
        .await
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u32,
    ) -> Result<Vec<QueryMatch>, VectorIndexError> {
        let vector = vector.as_slice();
        with_retry(&self.retry, "pinecone query", || self.run_query(vector, top_k)).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// Pinecone reports bare hostnames; tests and proxies may pass a full URL.
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

async fn error_for_status(response: Response) -> Result<Response, VectorIndexError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(VectorIndexError::ApiError { status, body })
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, VectorIndexError> {
    response
        .json()
        .await
        .map_err(|e| VectorIndexError::InvalidResponse(e.to_string()))
}
