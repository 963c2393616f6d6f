//! PDF text extraction module
//!
//! Extracts per-page text from PDF files using lopdf.

use crate::errors::IngestionError;
use std::path::Path;
use tracing::{debug, warn};

/// Extract the text of every page, in page order.
///
/// Pages that fail to decode are logged and skipped; a document with no
/// extractable text at all is an error.
pub fn extract_pages_from_pdf(path: &Path) -> Result<Vec<String>, IngestionError> {
    let doc = lopdf::Document::load(path).map_err(|e| IngestionError::PdfParseError {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let pages = doc.get_pages();

    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut texts = Vec::with_capacity(pages.len());
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => texts.push(clean_text(&page_text)),
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    if texts.iter().all(|t| t.trim().is_empty()) {
        return Err(IngestionError::PdfParseError {
            path: path.display().to_string(),
            message: "No text content extracted from PDF".to_string(),
        });
    }

    debug!(
        pages = texts.len(),
        chars = texts.iter().map(|t| t.len()).sum::<usize>(),
        "Text extraction complete"
    );

    Ok(texts)
}

/// Clean extracted text
pub(crate) fn clean_text(text: &str) -> String {
    text
        // Replace multiple whitespace with single space
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        // Remove byte order marks
        .replace('\u{FEFF}', "")
        // Normalize quotes
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        let input = "Hello   World\n\nTest";
        let cleaned = clean_text(input);
        assert_eq!(cleaned, "Hello World Test");
    }

    #[test]
    fn test_clean_text_normalizes_quotes() {
        assert_eq!(clean_text("\u{201C}deep\u{201D} \u{2018}fake\u{2019}"), "\"deep\" 'fake'");
    }

    #[test]
    fn test_missing_pdf_is_parse_error() {
        let err = extract_pages_from_pdf(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, IngestionError::PdfParseError { .. }));
    }
}
