//! Vector records and index responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::review::Review;

/// Metadata stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewMetadata {
    pub review: String,
    pub subject: String,
    pub stars: f64,
}

/// A vector ready to be written to the index. Serializes to the Pinecone wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ReviewMetadata,
}

impl UpsertRecord {
    pub fn from_review(review: Review, values: Vec<f32>) -> Self {
        Self {
            id: review.professor,
            values,
            metadata: ReviewMetadata {
                review: review.review,
                subject: review.subject,
                stars: review.stars,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceStats {
    #[serde(default)]
    pub vector_count: u64,
}

/// Index statistics as reported by `describe_index_stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceStats>,
    #[serde(default)]
    pub dimension: u32,
    #[serde(default)]
    pub index_fullness: f64,
    #[serde(default)]
    pub total_vector_count: u64,
}

impl IndexStats {
    pub fn namespace_count(&self, namespace: &str) -> u64 {
        self.namespaces
            .get(namespace)
            .map_or(0, |ns| ns.vector_count)
    }
}

/// One nearest-neighbour hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ReviewMetadata>,
}

/// Summary of a completed ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub index: String,
    pub namespace: String,
    pub reviews_read: u64,
    pub records_upserted: u64,
    pub dimension: u32,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<IndexStats>,
}
