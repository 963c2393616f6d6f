//! Chunks, indexed chunks, and retrieval results

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Provenance attached to every chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// File name of the source document, used as the citation key
    pub paper_name: String,
    pub source_document_id: String,
}

/// A window of a document's concatenated text.
///
/// Offsets and lengths are measured in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub start_offset: usize,
    pub length: usize,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(text: String, start_offset: usize, metadata: ChunkMetadata) -> Self {
        let length = text.chars().count();
        Self {
            text,
            start_offset,
            length,
            metadata,
        }
    }

    pub fn paper_name(&self) -> &str {
        &self.metadata.paper_name
    }

    /// Content address: hex SHA-256 over paper name and text
    pub fn content_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.metadata.paper_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.text.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A chunk stored in the corpus index together with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: String,
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

impl IndexedChunk {
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.content_id(),
            chunk,
            embedding,
        }
    }
}

/// An indexed chunk paired with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub indexed: IndexedChunk,
    pub score: f32,
}

impl ScoredChunk {
    pub fn paper_name(&self) -> &str {
        self.indexed.chunk.paper_name()
    }

    pub fn text(&self) -> &str {
        &self.indexed.chunk.text
    }
}

/// Top-k retrieval result, highest similarity first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    entries: Vec<ScoredChunk>,
}

impl RetrievedContext {
    pub fn new(entries: Vec<ScoredChunk>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredChunk> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ScoredChunk] {
        &self.entries
    }
}
