//! Retrieval over the corpus index
//!
//! The pipeline only depends on [`Retriever`]; [`VectorRetriever`] is the
//! production implementation backed by an [`IndexHandle`](crate::IndexHandle).

mod vector;

pub use vector::VectorRetriever;

use citewise_common::errors::Result;
use citewise_common::models::RetrievedContext;

/// Common trait for all retrievers
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` passages ranked by relevance to `query`
    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievedContext>;
}
