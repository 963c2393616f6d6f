//! Chunk curation
//!
//! Windows every document and keeps only the windows that pass the
//! [`ChunkFilter`]. Rejection is final: rejected windows never reach the index.

use crate::chunker::{chunk_document, ChunkingConfig};
use crate::errors::IngestionError;
use crate::filter::ChunkFilter;
use citewise_common::metrics;
use citewise_common::models::{Chunk, Document};
use std::collections::BTreeMap;
use tracing::info;

/// Counts produced by a curation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurationReport {
    pub documents: usize,
    pub total_windows: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<&'static str, usize>,
}

impl CurationReport {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Accepted chunks plus the report that explains what was dropped
#[derive(Debug, Clone)]
pub struct Curation {
    pub chunks: Vec<Chunk>,
    pub report: CurationReport,
}

/// Splits and filters documents into indexable chunks
#[derive(Debug, Clone)]
pub struct Curator {
    config: ChunkingConfig,
    filter: ChunkFilter,
}

impl Curator {
    pub fn new(config: ChunkingConfig) -> Result<Self, IngestionError> {
        config.validate()?;
        let filter = ChunkFilter::new(config.min_chunk_chars);
        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Curate documents in order. No input is mutated.
    pub fn curate(&self, documents: &[Document]) -> Curation {
        let mut report = CurationReport {
            documents: documents.len(),
            ..CurationReport::default()
        };
        let mut accepted = Vec::new();

        for document in documents {
            for chunk in chunk_document(document, &self.config) {
                report.total_windows += 1;
                match self.filter.evaluate(&chunk.text) {
                    None => accepted.push(chunk),
                    Some(reason) => {
                        tracing::trace!(
                            paper = %chunk.paper_name(),
                            offset = chunk.start_offset,
                            reason = %reason,
                            "Rejected chunk"
                        );
                        *report.rejected.entry(reason.label()).or_default() += 1;
                    }
                }
            }
        }

        report.accepted = accepted.len();

        let by_reason: Vec<(&'static str, usize)> =
            report.rejected.iter().map(|(k, v)| (*k, *v)).collect();
        metrics::record_curation(report.accepted, &by_reason);

        info!(
            documents = report.documents,
            total = report.total_windows,
            accepted = report.accepted,
            rejected = report.rejected_total(),
            "Curation complete"
        );

        Curation {
            chunks: accepted,
            report,
        }
    }
}

/// Window and filter `documents`, returning the accepted chunks.
///
/// An empty document list yields an empty result; the index builder is the
/// one that refuses to build from nothing.
pub fn curate(documents: &[Document], chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>, IngestionError> {
    let curator = Curator::new(ChunkingConfig::new(chunk_size, overlap)?)?;
    Ok(curator.curate(documents).chunks)
}
