//! Text chunking module
//!
//! Splits a document's concatenated pages into fixed-size, overlapping
//! character windows.

use crate::errors::IngestionError;
use citewise_common::config::ChunkingSettings;
use citewise_common::models::{Chunk, ChunkMetadata, Document};
use tracing::debug;

/// Configuration for text chunking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum trimmed length a window needs to survive curation
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_chars: 200,
        }
    }
}

impl ChunkingConfig {
    /// Build a validated config; overlap must be strictly smaller than the window
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestionError> {
        let config = Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), IngestionError> {
        if self.chunk_size == 0 {
            return Err(IngestionError::ChunkingError(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestionError::ChunkingError(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Distance between consecutive window starts
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

impl TryFrom<&ChunkingSettings> for ChunkingConfig {
    type Error = IngestionError;

    fn try_from(settings: &ChunkingSettings) -> Result<Self, Self::Error> {
        let config = Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            min_chunk_chars: settings.min_chunk_chars,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Split one document into sliding windows.
///
/// Every window except possibly the last is exactly `chunk_size` characters.
/// The walk stops once a window reaches the end of the text.
pub fn chunk_document(document: &Document, config: &ChunkingConfig) -> Vec<Chunk> {
    let text = document.full_text();
    let chars: Vec<char> = text.chars().collect();
    let total_len = chars.len();

    if total_len == 0 {
        return Vec::new();
    }

    let metadata = ChunkMetadata {
        paper_name: document.paper_name(),
        source_document_id: document.id().to_string(),
    };

    let stride = config.stride().max(1);
    let mut chunks = Vec::with_capacity(total_len / stride + 1);
    let mut start = 0;

    loop {
        let end = (start + config.chunk_size).min(total_len);
        let window: String = chars[start..end].iter().collect();
        chunks.push(Chunk::new(window, start, metadata.clone()));

        if end == total_len {
            break;
        }
        start += stride;
    }

    debug!(
        paper = %metadata.paper_name,
        input_chars = total_len,
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        "Document chunked"
    );

    chunks
}
