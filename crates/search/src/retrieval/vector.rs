//! Vector similarity retrieval over the in-memory corpus index

use super::Retriever;
use crate::handle::IndexHandle;
use citewise_common::embeddings::Embedder;
use citewise_common::errors::{AppError, Result};
use citewise_common::metrics;
use citewise_common::models::RetrievedContext;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Embeds the question and ranks the current index snapshot by cosine similarity
pub struct VectorRetriever {
    index: Arc<IndexHandle>,
    embedder: Arc<dyn Embedder>,
    timeout: Duration,
}

impl VectorRetriever {
    pub fn new(index: Arc<IndexHandle>, embedder: Arc<dyn Embedder>, timeout: Duration) -> Self {
        Self {
            index,
            embedder,
            timeout,
        }
    }

    pub fn index(&self) -> &Arc<IndexHandle> {
        &self.index
    }
}

#[async_trait::async_trait]
impl Retriever for VectorRetriever {
    #[instrument(skip(self, query))]
    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievedContext> {
        let start = Instant::now();
        let snapshot = self.index.snapshot().await;

        let context = tokio::time::timeout(self.timeout, snapshot.query(query, k, self.embedder.as_ref()))
            .await
            .map_err(|_| AppError::RetrievalTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        let elapsed = start.elapsed();
        metrics::record_retrieval(elapsed.as_secs_f64(), context.len());
        debug!(
            results = context.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Vector retrieval complete"
        );

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{BuildOptions, CorpusIndex};
    use citewise_common::embeddings::HashEmbedder;
    use citewise_common::models::{Chunk, ChunkMetadata};

    /// Never answers in time
    struct StalledEmbedder;

    #[async_trait::async_trait]
    impl Embedder for StalledEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![0.0; 8])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0; 8]).collect())
        }

        fn model_name(&self) -> &str {
            "stalled"
        }

        fn dimension(&self) -> usize {
            8
        }
    }

    fn chunk(paper: &str, text: &str) -> Chunk {
        Chunk::new(
            text.to_string(),
            0,
            ChunkMetadata {
                paper_name: paper.to_string(),
                source_document_id: paper.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_retrieve_from_handle() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(128));
        let index = CorpusIndex::build(
            "c",
            vec![
                chunk("a.pdf", "graph neural networks for molecules"),
                chunk("b.pdf", "deepfake detection with convolutional networks"),
            ],
            embedder.as_ref(),
            &BuildOptions::default(),
        )
        .await
        .unwrap();

        let retriever = VectorRetriever::new(
            Arc::new(IndexHandle::new(index)),
            embedder,
            Duration::from_secs(5),
        );
        let context = retriever.retrieve("deepfake detection", 1).await.unwrap();
        assert_eq!(context.len(), 1);
        assert_eq!(context.entries()[0].paper_name(), "b.pdf");
    }

    #[tokio::test]
    async fn test_slow_embedding_is_a_retrieval_timeout() {
        let embedder: Arc<dyn Embedder> = Arc::new(StalledEmbedder);
        let index = CorpusIndex::build("c", vec![chunk("a.pdf", "text")], embedder.as_ref(), &BuildOptions::default())
            .await
            .unwrap();

        let retriever = VectorRetriever::new(
            Arc::new(IndexHandle::new(index)),
            embedder,
            Duration::from_millis(20),
        );
        let err = retriever.retrieve("anything", 4).await.unwrap_err();
        assert!(matches!(err, AppError::RetrievalTimeout { timeout_ms: 20 }));
    }
}
