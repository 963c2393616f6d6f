//! Index persistence
//!
//! Each collection is one JSON file under the index directory. Saves go to
//! a temporary file first and are renamed into place, so a reader never
//! sees a half-written collection.

use crate::index::CorpusIndex;
use citewise_common::errors::{AppError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads and saves corpus indexes by collection name
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn validate_name(collection: &str) -> Result<()> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::Configuration {
                message: format!(
                    "Invalid collection name '{}': use letters, digits, '_' or '-'",
                    collection
                ),
            });
        }
        Ok(())
    }

    /// Path of the file backing `collection`
    pub fn path_for(&self, collection: &str) -> Result<PathBuf> {
        Self::validate_name(collection)?;
        Ok(self.dir.join(format!("{}.json", collection)))
    }

    pub async fn exists(&self, collection: &str) -> Result<bool> {
        let path = self.path_for(collection)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Persist an index under its own collection name
    pub async fn save(&self, index: &CorpusIndex) -> Result<PathBuf> {
        let path = self.path_for(index.collection())?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let bytes = serde_json::to_vec(index)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        info!(
            collection = %index.collection(),
            path = %path.display(),
            bytes = bytes.len(),
            "Index persisted"
        );
        Ok(path)
    }

    /// Load a previously saved collection
    pub async fn load(&self, collection: &str) -> Result<CorpusIndex> {
        let path = self.path_for(collection)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::IndexNotFound {
                    collection: collection.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let index: CorpusIndex = serde_json::from_slice(&bytes)?;
        debug!(
            collection,
            entries = index.len(),
            model = %index.model_id(),
            "Index loaded"
        );
        Ok(index)
    }
}
