//! Property tests for chunk windowing and the curation filter.

use citewise_common::models::Document;
use citewise_ingestion::filter::{BOILERPLATE_KEYWORDS, MAX_CITATION_MARKERS};
use citewise_ingestion::{chunk_document, ChunkFilter, ChunkingConfig, Curator};
use proptest::prelude::*;

fn arb_config() -> impl Strategy<Value = ChunkingConfig> {
    (20usize..400).prop_flat_map(|size| {
        (Just(size), 0..size).prop_map(|(size, overlap)| ChunkingConfig::new(size, overlap).unwrap())
    })
}

fn arb_pages() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-zA-Z0-9 .,\\[\\]]{0,600}", 0..5)
}

/// Every window but the last is exactly `chunk_size` characters, starts
/// advance by the stride, and the last window ends at the end of the text.
mod prop_windowing {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn windows_tile_the_text(pages in arb_pages(), config in arb_config()) {
            let doc = Document::new("paper.pdf", pages);
            let text: Vec<char> = doc.full_text().chars().collect();
            let chunks = chunk_document(&doc, &config);

            if text.is_empty() {
                prop_assert!(chunks.is_empty());
                return Ok(());
            }

            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.start_offset, i * config.stride());
                let expected: String = text[chunk.start_offset..chunk.start_offset + chunk.length].iter().collect();
                prop_assert_eq!(&chunk.text, &expected);
                if i + 1 < chunks.len() {
                    prop_assert_eq!(chunk.length, config.chunk_size);
                }
            }

            let last = chunks.last().unwrap();
            prop_assert_eq!(last.start_offset + last.length, text.len());
        }
    }
}

mod prop_filter_rules {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn citation_markers_always_reject(
            filler in "[a-z ]{200,600}",
            markers in proptest::collection::vec(0u32..10_000, MAX_CITATION_MARKERS..8),
        ) {
            let cited: Vec<String> = markers.iter().map(|n| format!("[{}]", n)).collect();
            let text = format!("{} {}", filler, cited.join(" "));
            prop_assert!(!ChunkFilter::default().accepts(&text));
        }

        #[test]
        fn short_text_always_rejected(
            core in "[a-z][a-z ]{0,197}[a-z]",
            pad in "[ \n\t]{0,40}",
        ) {
            let text = format!("{}{}{}", pad, core, pad);
            prop_assert!(!ChunkFilter::default().accepts(&text));
        }

        #[test]
        fn accepted_text_satisfies_every_rule(text in "[a-z .\\[\\]0-9:/]{150,500}") {
            let filter = ChunkFilter::default();
            if filter.accepts(&text) {
                let lower = text.to_lowercase();
                prop_assert!(BOILERPLATE_KEYWORDS.iter().all(|k| !lower.contains(k)));
                prop_assert!(lower.matches("http").count() + lower.matches("doi").count() < 2);
                prop_assert!(text.trim().chars().count() >= 200);
            }
        }
    }
}

mod prop_curation {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn curation_is_deterministic(pages in arb_pages(), config in arb_config()) {
            let curator = Curator::new(config).unwrap();
            let docs = vec![Document::new("a.pdf", pages.clone()), Document::new("b.txt", pages)];

            let first = curator.curate(&docs);
            let second = curator.curate(&docs);

            prop_assert_eq!(&first.chunks, &second.chunks);
            prop_assert_eq!(&first.report, &second.report);
            prop_assert_eq!(
                first.report.accepted + first.report.rejected_total(),
                first.report.total_windows
            );
        }
    }
}
