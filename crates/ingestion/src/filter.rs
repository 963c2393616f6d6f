//! Chunk filtering policy
//!
//! Rejects windows that are mostly reference lists or front/back matter:
//! they match queries on vocabulary but carry no supporting evidence.

use regex_lite::Regex;
use std::fmt;

/// Lowercase keywords that mark boilerplate sections
pub const BOILERPLATE_KEYWORDS: &[&str] = &[
    "references",
    "bibliography",
    "acknowledgements",
    "acknowledgments",
    "copyright",
    "conflict of interest",
];

/// Combined "http" + "doi" occurrences at which a window is rejected
pub const MAX_LINK_MARKERS: usize = 2;

/// Bracketed numeric citations (`[12]`) at which a window is rejected
pub const MAX_CITATION_MARKERS: usize = 3;

/// Why a window was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    BoilerplateKeyword(&'static str),
    LinkDensity(usize),
    CitationMarkers(usize),
    TooShort(usize),
}

impl RejectReason {
    /// Stable label for metrics and reports
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::BoilerplateKeyword(_) => "boilerplate_keyword",
            RejectReason::LinkDensity(_) => "link_density",
            RejectReason::CitationMarkers(_) => "citation_markers",
            RejectReason::TooShort(_) => "too_short",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::BoilerplateKeyword(k) => write!(f, "contains boilerplate keyword '{}'", k),
            RejectReason::LinkDensity(n) => write!(f, "{} link/doi markers", n),
            RejectReason::CitationMarkers(n) => write!(f, "{} bracketed citation markers", n),
            RejectReason::TooShort(n) => write!(f, "only {} characters after trimming", n),
        }
    }
}

/// Curation filter applied to every window before indexing
#[derive(Debug, Clone)]
pub struct ChunkFilter {
    citation_marker: Regex,
    min_chars: usize,
}

impl ChunkFilter {
    pub fn new(min_chars: usize) -> Self {
        Self {
            // Literal pattern, always valid
            citation_marker: Regex::new(r"\[\d+\]").expect("citation marker pattern"),
            min_chars,
        }
    }

    /// Return the first rule the text violates, or `None` if it is kept.
    ///
    /// Rules are checked in a fixed order so the reported reason is stable.
    pub fn evaluate(&self, text: &str) -> Option<RejectReason> {
        let lower = text.to_lowercase();

        if let Some(keyword) = BOILERPLATE_KEYWORDS.iter().find(|k| lower.contains(*k)) {
            return Some(RejectReason::BoilerplateKeyword(keyword));
        }

        let links = lower.matches("http").count() + lower.matches("doi").count();
        if links >= MAX_LINK_MARKERS {
            return Some(RejectReason::LinkDensity(links));
        }

        let citations = self.citation_marker.find_iter(text).count();
        if citations >= MAX_CITATION_MARKERS {
            return Some(RejectReason::CitationMarkers(citations));
        }

        let trimmed = text.trim().chars().count();
        if trimmed < self.min_chars {
            return Some(RejectReason::TooShort(trimmed));
        }

        None
    }

    pub fn accepts(&self, text: &str) -> bool {
        self.evaluate(text).is_none()
    }
}

impl Default for ChunkFilter {
    fn default() -> Self {
        Self::new(200)
    }
}
