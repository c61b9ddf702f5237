//! Review ingestion: embed each review, upsert the batch, read back stats.

use std::time::Instant;

use crate::error::IngestError;
use crate::models::{IngestReport, Review, UpsertRecord};
use crate::services::embedding::Embedder;
use crate::services::vector_index::VectorIndex;

/// Embed every review in order, one request per review.
///
/// The first failure aborts the whole batch; nothing has been written yet at
/// that point. `on_progress` is called after each review is embedded.
pub async fn build_records(
    reviews: Vec<Review>,
    embedder: &dyn Embedder,
    mut on_progress: impl FnMut(&Review),
) -> Result<Vec<UpsertRecord>, IngestError> {
    let mut records = Vec::with_capacity(reviews.len());

    for review in reviews {
        let values = embedder
            .embed(&review.review)
            .await
            .map_err(|source| IngestError::Embedding {
                professor: review.professor.clone(),
                source,
            })?;
        on_progress(&review);
        records.push(UpsertRecord::from_review(review, values));
    }

    Ok(records)
}

/// Run the full pipeline against an index that already exists.
pub async fn ingest(
    reviews: Vec<Review>,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    on_progress: impl FnMut(&Review),
) -> Result<IngestReport, IngestError> {
    let start = Instant::now();
    let reviews_read = reviews.len() as u64;

    let records = build_records(reviews, embedder, on_progress).await?;
    tracing::info!(
        count = records.len(),
        model = embedder.model_name(),
        "embedded reviews"
    );

    let records_upserted = index.upsert(records).await?;
    tracing::info!(
        index = index.name(),
        namespace = index.namespace(),
        records_upserted,
        "upsert complete"
    );

    let stats = index.describe_stats().await?;

    Ok(IngestReport {
        index: index.name().to_string(),
        namespace: index.namespace().to_string(),
        reviews_read,
        records_upserted,
        dimension: embedder.dimension() as u32,
        duration_ms: start.elapsed().as_millis() as u64,
        stats: Some(stats),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use crate::models::IndexConfig;
    use crate::services::vector_index::MemoryIndex;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Deterministic embedder: vector derived from text length.
    struct FakeEmbedder {
        dimension: usize,
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl FakeEmbedder {
        fn new(dimension: usize) -> Self {
            Self {
                dimension,
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.lock().unwrap().push(text.to_string());
            if self.fail_on == Some(text) {
                return Err(EmbeddingError::ServerError {
                    status: 400,
                    body: "rejected".to_string(),
                });
            }
            let mut values = vec![0.0; self.dimension];
            values[text.len() % self.dimension] = 1.0;
            Ok(values)
        }

        fn model_name(&self) -> &str {
            "fake"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }

    fn review(professor: &str, text: &str, subject: &str, stars: f64) -> Review {
        Review {
            professor: professor.to_string(),
            review: text.to_string(),
            subject: subject.to_string(),
            stars,
        }
    }

    fn sample() -> Vec<Review> {
        vec![
            review("Dr. Emily Johnson", "Engaging lectures.", "Biology", 5.0),
            review("Prof. Michael Chen", "Tough but fair.", "Physics", 3.5),
            review("Dr. Sarah Williams", "Rarely available.", "Chemistry", 2.0),
        ]
    }

    #[tokio::test]
    async fn test_one_record_per_review_with_same_fields() {
        let embedder = FakeEmbedder::new(4);
        let reviews = sample();

        let records = build_records(reviews.clone(), &embedder, |_| {})
            .await
            .unwrap();

        assert_eq!(records.len(), reviews.len());
        for (record, review) in records.iter().zip(&reviews) {
            assert_eq!(record.id, review.professor);
            assert_eq!(record.metadata.review, review.review);
            assert_eq!(record.metadata.subject, review.subject);
            assert_eq!(record.metadata.stars, review.stars);
            assert_eq!(record.values.len(), 4);
        }

        let calls = embedder.calls.lock().unwrap();
        let texts: Vec<&str> = reviews.iter().map(|r| r.review.as_str()).collect();
        assert_eq!(*calls, texts);
    }

    #[tokio::test]
    async fn test_progress_called_per_review() {
        let embedder = FakeEmbedder::new(4);
        let mut seen = Vec::new();

        build_records(sample(), &embedder, |r| seen.push(r.professor.clone()))
            .await
            .unwrap();

        assert_eq!(
            seen,
            vec!["Dr. Emily Johnson", "Prof. Michael Chen", "Dr. Sarah Williams"]
        );
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_run() {
        let mut embedder = FakeEmbedder::new(4);
        embedder.fail_on = Some("Tough but fair.");
        let index = MemoryIndex::new(&IndexConfig::default(), 4);

        let err = ingest(sample(), &embedder, &index, |_| {})
            .await
            .unwrap_err();

        match err {
            IngestError::Embedding { professor, .. } => assert_eq!(professor, "Prof. Michael Chen"),
            other => panic!("unexpected error: {other:?}"),
        }
        // The third review is never embedded and nothing reaches the index.
        assert_eq!(embedder.calls.lock().unwrap().len(), 2);
        assert_eq!(index.describe_stats().await.unwrap().total_vector_count, 0);
    }

    #[tokio::test]
    async fn test_ingest_reports_stats() {
        let embedder = FakeEmbedder::new(4);
        let index = MemoryIndex::new(&IndexConfig::default(), 4);

        let report = ingest(sample(), &embedder, &index, |_| {}).await.unwrap();

        assert_eq!(report.reviews_read, 3);
        assert_eq!(report.records_upserted, 3);
        assert_eq!(report.dimension, 4);
        assert_eq!(report.namespace, "ns1");
        assert_eq!(report.stats.unwrap().namespace_count("ns1"), 3);
    }

    #[tokio::test]
    async fn test_duplicate_professor_overwrites() {
        let embedder = FakeEmbedder::new(4);
        let index = MemoryIndex::new(&IndexConfig::default(), 4);
        let reviews = vec![
            review("Dr. Smith", "Boring.", "Math", 1.0),
            review("Dr. Smith", "Actually great.", "Math", 5.0),
        ];

        let report = ingest(reviews, &embedder, &index, |_| {}).await.unwrap();

        assert_eq!(report.records_upserted, 2);
        assert_eq!(report.stats.unwrap().total_vector_count, 1);

        let matches = index.query(embedder.embed("Actually great.").await.unwrap(), 1).await.unwrap();
        assert_eq!(matches[0].metadata.as_ref().unwrap().stars, 5.0);
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let embedder = FakeEmbedder::new(4);
        let index = MemoryIndex::new(&IndexConfig::default(), 4);

        ingest(sample(), &embedder, &index, |_| {}).await.unwrap();
        let report = ingest(sample(), &embedder, &index, |_| {}).await.unwrap();

        assert_eq!(report.stats.unwrap().total_vector_count, 3);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected_by_index() {
        let embedder = FakeEmbedder::new(4);
        let index = MemoryIndex::new(&IndexConfig::default(), 8);

        let err = ingest(sample(), &embedder, &index, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::VectorIndex(_)));
    }
}
