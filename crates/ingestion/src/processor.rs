//! Ingestion processor
//!
//! Drives an index build end to end: load the corpus, curate chunks, embed
//! them into a [`CorpusIndex`], persist it, and optionally publish it to a
//! live [`IndexHandle`].

use crate::curator::{CurationReport, Curator};
use crate::errors::IngestionError;
use crate::loader::DocumentLoader;
use citewise_common::config::AppConfig;
use citewise_common::embeddings::Embedder;
use citewise_common::errors::AppError;
use citewise_search::{BuildOptions, CorpusIndex, IndexHandle, IndexStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub collection: String,
    pub model_id: String,
    pub entries: usize,
    pub curation: CurationReport,
    pub path: Option<PathBuf>,
    pub elapsed_ms: u64,
}

/// Ingestion processor
pub struct IngestionProcessor {
    loader: Arc<dyn DocumentLoader>,
    curator: Curator,
    embedder: Arc<dyn Embedder>,
    store: Option<IndexStore>,
    collection: String,
    build_options: BuildOptions,
}

impl IngestionProcessor {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        curator: Curator,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            curator,
            embedder,
            store: None,
            collection: collection.into(),
            build_options: BuildOptions::default(),
        }
    }

    /// Wire a processor from application config
    pub fn from_config(
        config: &AppConfig,
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, IngestionError> {
        let curator = Curator::new((&config.chunking).try_into()?)?;
        Ok(Self::new(loader, curator, embedder, config.index.collection.clone())
            .with_store(IndexStore::new(&config.index.dir))
            .with_build_options(BuildOptions {
                concurrency: config.index.embed_concurrency,
                batch_size: config.embedding.batch_size,
                embed_timeout: config.embedding_batch_timeout(),
            }))
    }

    /// Persist every build through `store`
    pub fn with_store(mut self, store: IndexStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_build_options(mut self, options: BuildOptions) -> Self {
        self.build_options = options;
        self
    }

    /// Load, curate and embed the corpus under `corpus_dir`.
    ///
    /// A corpus with no loadable documents, or whose every window is
    /// rejected, fails with [`AppError::EmptyCorpus`].
    #[instrument(skip(self), fields(corpus = %corpus_dir.display(), collection = %self.collection))]
    pub async fn build_index(&self, corpus_dir: &Path) -> Result<(CorpusIndex, IndexSummary), IngestionError> {
        let started = Instant::now();

        let documents = match self.loader.load(corpus_dir).await {
            Ok(documents) => documents,
            Err(IngestionError::NoDocuments(_)) => return Err(AppError::EmptyCorpus.into()),
            Err(e) => return Err(e),
        };

        let curation = self.curator.curate(&documents);
        if curation.chunks.is_empty() {
            return Err(AppError::EmptyCorpus.into());
        }

        let index = CorpusIndex::build(
            &self.collection,
            curation.chunks,
            self.embedder.as_ref(),
            &self.build_options,
        )
        .await?;

        let path = match &self.store {
            Some(store) => Some(store.save(&index).await?),
            None => None,
        };

        let summary = IndexSummary {
            collection: index.collection().to_string(),
            model_id: index.model_id().to_string(),
            entries: index.len(),
            curation: curation.report,
            path,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            entries = summary.entries,
            documents = summary.curation.documents,
            rejected = summary.curation.rejected_total(),
            elapsed_ms = summary.elapsed_ms,
            "Index build complete"
        );

        Ok((index, summary))
    }

    /// Build and atomically replace the index served by `handle`.
    ///
    /// On failure the handle keeps serving the previous index.
    pub async fn rebuild_into(&self, corpus_dir: &Path, handle: &IndexHandle) -> Result<IndexSummary, IngestionError> {
        let (index, summary) = self.build_index(corpus_dir).await?;
        handle.swap(index).await;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkingConfig;
    use crate::loader::DirectoryLoader;
    use std::time::Duration;
    use citewise_common::embeddings::HashEmbedder;

    fn prose(len: usize) -> String {
        "Face forgery detectors learn blending boundaries between source and target. "
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    fn processor() -> IngestionProcessor {
        IngestionProcessor::new(
            Arc::new(DirectoryLoader::default()),
            Curator::new(ChunkingConfig::default()).unwrap(),
            Arc::new(HashEmbedder::new(64)),
            "research_papers",
        )
    }

    #[tokio::test]
    async fn test_build_from_text_corpus() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), prose(2400)).unwrap();
        std::fs::write(dir.path().join("b.txt"), prose(900)).unwrap();

        let (index, summary) = processor().build_index(dir.path()).await.unwrap();
        assert!(index.len() > 0);
        assert_eq!(summary.curation.documents, 2);
        assert_eq!(summary.model_id, "hash-bow-64");
        assert!(summary.path.is_none());
    }

    #[test]
    fn test_from_config_gives_batches_room_to_retry() {
        let mut config = AppConfig::default();
        config.embedding.timeout_secs = 5;
        config.embedding.max_retries = 2;

        let processor = IngestionProcessor::from_config(
            &config,
            Arc::new(DirectoryLoader::default()),
            Arc::new(HashEmbedder::new(64)),
        )
        .unwrap();

        assert_eq!(processor.build_options.embed_timeout, Duration::from_millis(10_200));
        assert!(processor.build_options.embed_timeout > config.embedding_timeout());
    }

    #[tokio::test]
    async fn test_empty_directory_is_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let err = processor().build_index(dir.path()).await.unwrap_err();
        assert!(matches!(err, IngestionError::Common(AppError::EmptyCorpus)));
    }

    #[tokio::test]
    async fn test_all_rejected_is_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("refs.txt"), format!("References {}", prose(500))).unwrap();

        let err = processor().build_index(dir.path()).await.unwrap_err();
        assert!(matches!(err, IngestionError::Common(AppError::EmptyCorpus)));
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_index() {
        let corpus = tempfile::tempdir().unwrap();
        std::fs::write(corpus.path().join("a.txt"), prose(1500)).unwrap();

        let processor = processor();
        let (index, _) = processor.build_index(corpus.path()).await.unwrap();
        let entries = index.len();
        let handle = IndexHandle::new(index);

        let empty = tempfile::tempdir().unwrap();
        assert!(processor.rebuild_into(empty.path(), &handle).await.is_err());
        assert_eq!(handle.snapshot().await.len(), entries);
    }

    #[tokio::test]
    async fn test_build_persists_with_store() {
        let corpus = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::write(corpus.path().join("a.txt"), prose(1200)).unwrap();

        let processor = processor().with_store(IndexStore::new(out.path()));
        let (_, summary) = processor.build_index(corpus.path()).await.unwrap();

        let path = summary.path.unwrap();
        assert!(path.exists());
        let loaded = IndexStore::new(out.path()).load("research_papers").await.unwrap();
        assert_eq!(loaded.len(), summary.entries);
    }
}
