//! Context Assembler - renders retrieved chunks into prompt context
//!
//! Each chunk becomes its own provenance-tagged block, in rank order.
//! Chunks from the same paper are not merged so the model can attribute
//! evidence per snippet.

use citewise_common::models::{RetrievedContext, ScoredChunk};

/// Separator between rendered blocks
pub const BLOCK_SEPARATOR: &str = "\n\n";

fn render_block(entry: &ScoredChunk) -> String {
    format!("[Source: {}]\n{}", entry.paper_name(), entry.text())
}

/// Render `context` as `[Source: <paper_name>]\n<text>` blocks joined by a blank line.
///
/// An empty context renders as an empty string.
pub fn assemble(context: &RetrievedContext) -> String {
    context
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use citewise_common::models::{Chunk, ChunkMetadata, IndexedChunk};

    fn scored(paper: &str, text: &str, score: f32) -> ScoredChunk {
        let chunk = Chunk::new(
            text.to_string(),
            0,
            ChunkMetadata {
                paper_name: paper.to_string(),
                source_document_id: paper.to_string(),
            },
        );
        ScoredChunk {
            indexed: IndexedChunk::new(chunk, vec![1.0]),
            score,
        }
    }

    #[test]
    fn test_blocks_in_rank_order() {
        let context = RetrievedContext::new(vec![
            scored("DeepfakeCNN2021.pdf", "ResNet-based classifier", 0.9),
            scored("Survey2020.pdf", "detectors overview", 0.5),
        ]);

        assert_eq!(
            assemble(&context),
            "[Source: DeepfakeCNN2021.pdf]\nResNet-based classifier\n\n[Source: Survey2020.pdf]\ndetectors overview"
        );
    }

    #[test]
    fn test_same_paper_not_deduplicated() {
        let context = RetrievedContext::new(vec![
            scored("a.pdf", "first", 0.9),
            scored("a.pdf", "second", 0.8),
            scored("b.pdf", "third", 0.7),
        ]);

        let out = assemble(&context);
        assert_eq!(out.matches("[Source: ").count(), 3);
        assert_eq!(out.matches("[Source: a.pdf]").count(), 2);
        let first = out.find("first").unwrap();
        let second = out.find("second").unwrap();
        let third = out.find("third").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(assemble(&RetrievedContext::empty()), "");
    }
}
