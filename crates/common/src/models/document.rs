//! Loaded source document

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A loaded document: its source identifier and ordered page texts.
///
/// Immutable once constructed; the loader produces one per file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    pages: Vec<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            id: id.into(),
            pages,
        }
    }

    /// Source identifier, usually the file path
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// File name component of the source identifier
    pub fn paper_name(&self) -> String {
        Path::new(&self.id)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id.clone())
    }

    /// Pages joined in order with a single newline
    pub fn full_text(&self) -> String {
        self.pages.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_name_is_basename() {
        let doc = Document::new("/data/papers/DeepfakeCNN2021.pdf", vec![]);
        assert_eq!(doc.paper_name(), "DeepfakeCNN2021.pdf");
    }

    #[test]
    fn test_paper_name_without_directory() {
        let doc = Document::new("notes.txt", vec![]);
        assert_eq!(doc.paper_name(), "notes.txt");
    }

    #[test]
    fn test_full_text_joins_pages_in_order() {
        let doc = Document::new("a.pdf", vec!["first".into(), "second".into()]);
        assert_eq!(doc.full_text(), "first\nsecond");
    }
}
