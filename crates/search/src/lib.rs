//! Citewise Search
//!
//! Content-addressed vector index over curated chunks, its on-disk store,
//! and the retriever the answer pipeline queries.

mod handle;
mod index;
mod store;

pub mod retrieval;

pub use handle::IndexHandle;
pub use index::{cosine_similarity, BuildOptions, CorpusIndex};
pub use retrieval::{Retriever, VectorRetriever};
pub use store::IndexStore;
