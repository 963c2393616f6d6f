//! Citewise Ingestion
//!
//! Loads a corpus of papers, curates their text into chunks, and builds
//! the corpus index the answer pipeline retrieves from.

pub mod chunker;
pub mod curator;
pub mod errors;
pub mod filter;
pub mod loader;
pub mod pdf;
pub mod processor;

pub use chunker::{chunk_document, ChunkingConfig};
pub use curator::{curate, Curation, CurationReport, Curator};
pub use errors::IngestionError;
pub use filter::{ChunkFilter, RejectReason};
pub use loader::{DirectoryLoader, DocumentLoader};
pub use processor::{IndexSummary, IngestionProcessor};
