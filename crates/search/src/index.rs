//! Corpus index
//!
//! A content-addressed, in-memory vector index over curated chunks. Each
//! entry is keyed by the SHA-256 of its paper name and text; the index
//! records the embedding model it was built with and refuses queries
//! embedded by any other model.

use chrono::{DateTime, Utc};
use citewise_common::embeddings::Embedder;
use citewise_common::errors::{AppError, Result};
use citewise_common::metrics;
use citewise_common::models::{Chunk, IndexedChunk, RetrievedContext, ScoredChunk};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Options controlling how a build talks to the embedding provider
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Concurrent embedding batches in flight
    pub concurrency: usize,
    /// Texts per embedding request
    pub batch_size: usize,
    /// Per-batch timeout
    pub embed_timeout: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            batch_size: 16,
            embed_timeout: Duration::from_secs(30),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// The queryable corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusIndex {
    collection: String,
    model_id: String,
    dimension: usize,
    built_at: DateTime<Utc>,
    entries: Vec<IndexedChunk>,
}

impl CorpusIndex {
    /// An index with no entries; queries against it return no evidence
    pub fn empty(collection: impl Into<String>, model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection: collection.into(),
            model_id: model_id.into(),
            dimension,
            built_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Embed every chunk and build a new index.
    ///
    /// Entries keep the order of `chunks`; a chunk whose content address
    /// already exists is stored once. Identical texts are embedded once.
    /// Batches run concurrently but results are merged in input order, so two
    /// builds over the same chunks produce the same index entries.
    #[instrument(skip(chunks, embedder, options), fields(chunks = chunks.len(), model = %embedder.model_name()))]
    pub async fn build(
        collection: &str,
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        options: &BuildOptions,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(AppError::EmptyCorpus);
        }

        let started = Instant::now();

        let mut seen = HashSet::new();
        let unique: Vec<Chunk> = chunks
            .into_iter()
            .filter(|c| seen.insert(c.content_id()))
            .collect();

        let mut text_slots: HashMap<&str, usize> = HashMap::new();
        let mut texts: Vec<String> = Vec::new();
        for chunk in &unique {
            text_slots.entry(chunk.text.as_str()).or_insert_with(|| {
                texts.push(chunk.text.clone());
                texts.len() - 1
            });
        }

        debug!(entries = unique.len(), distinct_texts = texts.len(), "Embedding corpus");

        let timeout = options.embed_timeout;
        let batches: Vec<Vec<String>> = texts
            .chunks(options.batch_size.max(1))
            .map(|b| b.to_vec())
            .collect();

        // `buffered` yields in submission order regardless of completion order
        let vectors: Vec<Vec<f32>> = stream::iter(batches)
            .map(|batch| async move {
                let expected = batch.len();
                let embedded = tokio::time::timeout(timeout, embedder.embed_batch(&batch))
                    .await
                    .map_err(|_| AppError::EmbeddingTimeout {
                        timeout_ms: timeout.as_millis() as u64,
                    })??;
                if embedded.len() != expected {
                    return Err(AppError::EmbeddingError {
                        message: format!("Expected {} embeddings, got {}", expected, embedded.len()),
                    });
                }
                Ok::<_, AppError>(embedded)
            })
            .buffered(options.concurrency.max(1))
            .try_concat()
            .await?;

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 || vectors.iter().any(|v| v.len() != dimension) {
            return Err(AppError::EmbeddingError {
                message: "Embedding provider returned vectors of inconsistent dimension".to_string(),
            });
        }

        let entries: Vec<IndexedChunk> = unique
            .iter()
            .map(|chunk| {
                let slot = text_slots[chunk.text.as_str()];
                IndexedChunk::new(chunk.clone(), vectors[slot].clone())
            })
            .collect();

        let index = Self {
            collection: collection.to_string(),
            model_id: embedder.model_name().to_string(),
            dimension,
            built_at: Utc::now(),
            entries,
        };

        metrics::record_index_build(started.elapsed().as_secs_f64(), index.len());
        info!(
            collection = %index.collection,
            entries = index.len(),
            dimension,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Corpus index built"
        );

        Ok(index)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Identifier of the embedding model used at build time
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn entries(&self) -> &[IndexedChunk] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail unless `model_id` matches the build-time embedding model
    pub fn ensure_model(&self, model_id: &str) -> Result<()> {
        if self.model_id != model_id {
            return Err(AppError::IndexMismatch {
                expected: self.model_id.clone(),
                actual: model_id.to_string(),
            });
        }
        Ok(())
    }

    /// Embed `text` with `embedder` and return the `k` most similar chunks.
    ///
    /// An empty index yields an empty context rather than an error.
    pub async fn query(&self, text: &str, k: usize, embedder: &dyn Embedder) -> Result<RetrievedContext> {
        self.ensure_model(embedder.model_name())?;

        if self.is_empty() || k == 0 {
            return Ok(RetrievedContext::empty());
        }

        let query_vector = embedder.embed(text).await?;
        if query_vector.len() != self.dimension {
            return Err(AppError::IndexMismatch {
                expected: format!("{} ({} dims)", self.model_id, self.dimension),
                actual: format!("{} ({} dims)", embedder.model_name(), query_vector.len()),
            });
        }

        Ok(self.search_vector(&query_vector, k))
    }

    /// Rank entries by descending cosine similarity; ties keep insertion order
    pub fn search_vector(&self, query: &[f32], k: usize) -> RetrievedContext {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                score: cosine_similarity(&entry.embedding, query),
                indexed: entry.clone(),
            })
            .collect();

        // total order so NaN scores cannot break the sort; stability gives the tie break
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        RetrievedContext::new(scored)
    }
}
