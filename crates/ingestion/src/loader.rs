//! Document loading
//!
//! Walks a corpus directory and turns every supported file into a
//! [`Document`] of page texts. PDFs are split by page; plain-text files
//! are split on form feeds.

use crate::errors::IngestionError;
use crate::pdf::{clean_text, extract_pages_from_pdf};
use async_trait::async_trait;
use citewise_common::errors::AppError;
use citewise_common::models::Document;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Yields documents for a corpus location
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, location: &Path) -> Result<Vec<Document>, IngestionError>;
}

/// Recursive directory loader for `.pdf` and `.txt` files
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    extensions: Vec<String>,
    concurrency: usize,
}

impl DirectoryLoader {
    pub fn new(extensions: &[String], concurrency: usize) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.trim_start_matches('.').to_lowercase()).collect(),
            concurrency: concurrency.max(1),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .map(|ext| self.extensions.contains(&ext))
            .unwrap_or(false)
    }

    /// Collect matching files in walk order, sorted by file name at every
    /// level so document order is deterministic. Symlinks are not followed.
    fn discover(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable corpus entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.accepts(entry.path()))
            .map(|entry| entry.into_path())
            .collect()
    }
}

impl Default for DirectoryLoader {
    fn default() -> Self {
        Self::new(&["pdf".to_string(), "txt".to_string()], 4)
    }
}

/// Load a single file into pages
pub fn load_file(path: &Path) -> Result<Document, IngestionError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let pages = match ext.as_str() {
        "pdf" => extract_pages_from_pdf(path)?,
        _ => std::fs::read_to_string(path)?
            .split('\u{000C}')
            .map(clean_text)
            .collect(),
    };

    Ok(Document::new(path.display().to_string(), pages))
}

#[async_trait]
impl DocumentLoader for DirectoryLoader {
    async fn load(&self, location: &Path) -> Result<Vec<Document>, IngestionError> {
        if !location.is_dir() {
            return Err(IngestionError::CorpusNotFound(location.display().to_string()));
        }

        let paths = self.discover(location);
        info!(files = paths.len(), root = %location.display(), "Discovered corpus files");

        // `buffered` keeps input order while loading several files at once
        let results: Vec<_> = stream::iter(paths)
            .map(|path| async move {
                let loaded_path = path.clone();
                let result = tokio::task::spawn_blocking(move || load_file(&loaded_path))
                    .await
                    .map_err(|e| {
                        IngestionError::Common(AppError::Internal {
                            message: format!("Loader task failed: {}", e),
                        })
                    })
                    .and_then(|r| r);
                (path, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut documents = Vec::with_capacity(results.len());
        for (path, result) in results {
            match result {
                Ok(doc) => {
                    debug!(path = %path.display(), pages = doc.pages().len(), "Loaded document");
                    documents.push(doc);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable document"),
            }
        }

        if documents.is_empty() {
            return Err(IngestionError::NoDocuments(location.display().to_string()));
        }

        info!(documents = documents.len(), "Loaded corpus");
        Ok(documents)
    }
}
