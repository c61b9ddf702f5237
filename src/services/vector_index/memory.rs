//! In-process index used for dry runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Provisioned, VectorIndex};
use crate::error::VectorIndexError;
use crate::models::{IndexConfig, IndexStats, Metric, NamespaceStats, QueryMatch, UpsertRecord};

/// Records keyed by namespace, then by id. Upserts overwrite by id.
pub struct MemoryIndex {
    name: String,
    namespace: String,
    metric: Metric,
    dimension: usize,
    namespaces: RwLock<HashMap<String, HashMap<String, UpsertRecord>>>,
}

impl MemoryIndex {
    pub fn new(config: &IndexConfig, dimension: u32) -> Self {
        Self {
            name: config.name.clone(),
            namespace: config.namespace.clone(),
            metric: config.metric,
            dimension: dimension as usize,
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            Metric::Cosine => cosine_similarity(a, b),
            Metric::DotProduct => dot(a, b),
            Metric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f32>(),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm = dot(a, a).sqrt() * dot(b, b).sqrt();
    if norm == 0.0 { 0.0 } else { dot(a, b) / norm }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn ensure_index(&self) -> Result<Provisioned, VectorIndexError> {
        let mut namespaces = self.namespaces.write().await;
        if namespaces.contains_key(&self.namespace) {
            return Ok(Provisioned::AlreadyExists);
        }
        namespaces.insert(self.namespace.clone(), HashMap::new());
        Ok(Provisioned::Created)
    }

    async fn upsert(&self, records: Vec<UpsertRecord>) -> Result<u64, VectorIndexError> {
        if let Some(bad) = records.iter().find(|r| r.values.len() != self.dimension) {
            return Err(VectorIndexError::DimensionMismatch {
                index: self.dimension,
                vector: bad.values.len(),
            });
        }

        let written = records.len() as u64;
        let mut namespaces = self.namespaces.write().await;
        let namespace = namespaces.entry(self.namespace.clone()).or_default();
        for record in records {
            namespace.insert(record.id.clone(), record);
        }
        Ok(written)
    }

    async fn describe_stats(&self) -> Result<IndexStats, VectorIndexError> {
        let namespaces = self.namespaces.read().await;
        let mut stats = IndexStats {
            dimension: self.dimension as u32,
            ..Default::default()
        };
        for (name, records) in namespaces.iter().filter(|(_, r)| !r.is_empty()) {
            let vector_count = records.len() as u64;
            stats.total_vector_count += vector_count;
            stats
                .namespaces
                .insert(name.clone(), NamespaceStats { vector_count });
        }
        Ok(stats)
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u32,
    ) -> Result<Vec<QueryMatch>, VectorIndexError> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                index: self.dimension,
                vector: vector.len(),
            });
        }

        let namespaces = self.namespaces.read().await;
        let Some(records) = namespaces.get(&self.namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<QueryMatch> = records
            .values()
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: self.score(&vector, &record.values),
                metadata: Some(record.metadata.clone()),
            })
            .collect();

        // Euclidean scores are distances; smaller is closer.
        match self.metric {
            Metric::Euclidean => matches.sort_by(|a, b| a.score.total_cmp(&b.score)),
            Metric::Cosine | Metric::DotProduct => {
                matches.sort_by(|a, b| b.score.total_cmp(&a.score))
            }
        }
        matches.truncate(top_k as usize);
        Ok(matches)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
