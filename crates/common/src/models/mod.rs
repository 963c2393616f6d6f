//! Core data model
//!
//! Types that flow through the pipeline, leaves first:
//! documents, curated chunks, indexed chunks, retrieval results, and the
//! structured answer returned to callers.

mod answer;
mod chunk;
mod document;

pub use answer::{ResearchAnswer, INSUFFICIENT_EVIDENCE};
pub use chunk::{Chunk, ChunkMetadata, IndexedChunk, RetrievedContext, ScoredChunk};
pub use document::Document;
