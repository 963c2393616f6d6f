//! Shared, swappable index reference
//!
//! Queries take a snapshot (`Arc<CorpusIndex>`) and keep using it even if a
//! rebuild publishes a new index mid-query. Publishing replaces the pointer
//! in one step, so a reader sees either the old index or the new one.

use crate::index::CorpusIndex;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Arc<CorpusIndex>>,
}

impl IndexHandle {
    pub fn new(index: CorpusIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// The index currently being served
    pub async fn snapshot(&self) -> Arc<CorpusIndex> {
        Arc::clone(&*self.current.read().await)
    }

    /// Publish `index`, returning the one it replaced
    pub async fn swap(&self, index: CorpusIndex) -> Arc<CorpusIndex> {
        let next = Arc::new(index);
        let mut guard = self.current.write().await;
        let previous = std::mem::replace(&mut *guard, next);
        info!(
            collection = %guard.collection(),
            entries = guard.len(),
            previous_entries = previous.len(),
            "Index swapped"
        );
        previous
    }
}
