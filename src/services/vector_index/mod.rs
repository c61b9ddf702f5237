//! Vector index abstraction layer.
//!
//! The ingestion pipeline and the assistant only talk to [`VectorIndex`]; the
//! configured driver decides whether records go to Pinecone or stay in memory.

mod memory;
mod pinecone;

pub use memory::MemoryIndex;
pub use pinecone::PineconeBackend;

use async_trait::async_trait;

use crate::error::{AppError, VectorIndexError};
use crate::models::{
    Config, IndexDriver, IndexStats, PINECONE_API_KEY_VAR, QueryMatch, UpsertRecord, require_env,
};

/// Outcome of [`VectorIndex::ensure_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

/// Operations the pipeline needs from a vector index.
///
/// Every record operation is scoped to the backend's namespace.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the index if it doesn't exist and wait until it accepts writes.
    async fn ensure_index(&self) -> Result<Provisioned, VectorIndexError>;

    /// Insert or overwrite records by id. Returns the number of records written.
    async fn upsert(&self, records: Vec<UpsertRecord>) -> Result<u64, VectorIndexError>;

    async fn describe_stats(&self) -> Result<IndexStats, VectorIndexError>;

    /// Nearest neighbours of `vector`, best first, with metadata.
    async fn query(&self, vector: Vec<f32>, top_k: u32)
    -> Result<Vec<QueryMatch>, VectorIndexError>;

    fn name(&self) -> &str;

    fn namespace(&self) -> &str;
}

/// Create the backend selected by `config.index.driver`.
pub fn create_index(config: &Config) -> Result<Box<dyn VectorIndex>, AppError> {
    let dimension = config.embedding.dimension();

    match config.index.driver {
        IndexDriver::Pinecone => {
            let api_key = require_env(PINECONE_API_KEY_VAR)?;
            let backend =
                PineconeBackend::new(&config.index, dimension, api_key, config.retry.policy())?;
            Ok(Box::new(backend))
        }
        IndexDriver::Memory => Ok(Box::new(MemoryIndex::new(&config.index, dimension))),
    }
}
