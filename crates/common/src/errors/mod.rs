//! Error types for Citewise
//!
//! Provides a single error taxonomy shared by every pipeline stage:
//! - Build-time failures (empty corpus, configuration, document loading)
//! - Query-time failures (retrieval timeout, model invocation, schema parsing)
//! - Error codes for callers that need machine-readable identification

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Corpus errors (1xxx)
    EmptyCorpus,
    DocumentLoadError,

    // Index errors (2xxx)
    IndexMismatch,
    IndexNotFound,

    // Retrieval errors (3xxx)
    RetrievalTimeout,
    EmbeddingError,
    EmbeddingTimeout,

    // Model errors (4xxx)
    ModelInvocationError,
    ModelTimeout,
    SchemaParseError,

    // Control flow (5xxx)
    Cancelled,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
    IoError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Corpus (1xxx)
            ErrorCode::EmptyCorpus => 1001,
            ErrorCode::DocumentLoadError => 1002,

            // Index (2xxx)
            ErrorCode::IndexMismatch => 2001,
            ErrorCode::IndexNotFound => 2002,

            // Retrieval (3xxx)
            ErrorCode::RetrievalTimeout => 3001,
            ErrorCode::EmbeddingError => 3002,
            ErrorCode::EmbeddingTimeout => 3003,

            // Model (4xxx)
            ErrorCode::ModelInvocationError => 4001,
            ErrorCode::ModelTimeout => 4002,
            ErrorCode::SchemaParseError => 4003,

            // Control flow (5xxx)
            ErrorCode::Cancelled => 5001,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
            ErrorCode::IoError => 9004,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Corpus errors
    #[error("No chunks survived curation; refusing to build an empty index")]
    EmptyCorpus,

    #[error("Failed to load document {path}: {message}")]
    DocumentLoad { path: String, message: String },

    // Index errors
    #[error("Index mismatch: index was built with '{expected}', query supplied '{actual}'")]
    IndexMismatch { expected: String, actual: String },

    #[error("Index collection not found: {collection}")]
    IndexNotFound { collection: String },

    // Retrieval errors
    #[error("Retrieval timed out after {timeout_ms}ms")]
    RetrievalTimeout { timeout_ms: u64 },

    #[error("Embedding service error: {message}")]
    EmbeddingError { message: String },

    #[error("Embedding timeout after {timeout_ms}ms")]
    EmbeddingTimeout { timeout_ms: u64 },

    // Model errors
    #[error("Language model invocation failed: {message}")]
    ModelInvocation { message: String },

    #[error("Language model timed out after {timeout_ms}ms")]
    ModelTimeout { timeout_ms: u64 },

    #[error("Model response did not match the answer schema after {attempts} attempt(s): {violation}")]
    SchemaParse { raw: String, violation: String, attempts: u32 },

    // Control flow
    #[error("Query cancelled before {stage}")]
    Cancelled { stage: String },

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::EmptyCorpus => ErrorCode::EmptyCorpus,
            AppError::DocumentLoad { .. } => ErrorCode::DocumentLoadError,
            AppError::IndexMismatch { .. } => ErrorCode::IndexMismatch,
            AppError::IndexNotFound { .. } => ErrorCode::IndexNotFound,
            AppError::RetrievalTimeout { .. } => ErrorCode::RetrievalTimeout,
            AppError::EmbeddingError { .. } => ErrorCode::EmbeddingError,
            AppError::EmbeddingTimeout { .. } => ErrorCode::EmbeddingTimeout,
            AppError::ModelInvocation { .. } => ErrorCode::ModelInvocationError,
            AppError::ModelTimeout { .. } => ErrorCode::ModelTimeout,
            AppError::SchemaParse { .. } => ErrorCode::SchemaParseError,
            AppError::Cancelled { .. } => ErrorCode::Cancelled,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Query-time failures that the caller should report instead of crashing
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::RetrievalTimeout { .. }
                | AppError::EmbeddingError { .. }
                | AppError::EmbeddingTimeout { .. }
                | AppError::ModelInvocation { .. }
                | AppError::ModelTimeout { .. }
                | AppError::SchemaParse { .. }
                | AppError::Cancelled { .. }
        )
    }

    /// True for both flavours of language-model failure
    pub fn is_model_failure(&self) -> bool {
        matches!(self, AppError::ModelInvocation { .. } | AppError::ModelTimeout { .. })
    }

    /// Human-facing message for the presentation boundary
    pub fn user_message(&self) -> String {
        match self {
            AppError::EmptyCorpus => {
                "The corpus produced no indexable passages. Check the document directory.".to_string()
            }
            AppError::IndexNotFound { collection } => format!(
                "No index named '{}' was found. Run the ingestion step first.",
                collection
            ),
            AppError::IndexMismatch { .. } => {
                "The index was built with a different embedding model. Rebuild the index.".to_string()
            }
            AppError::RetrievalTimeout { .. } | AppError::EmbeddingTimeout { .. } => {
                "Searching the corpus took too long. Please try again.".to_string()
            }
            AppError::ModelInvocation { .. } | AppError::ModelTimeout { .. } => {
                "The language model is unavailable right now. Please try again.".to_string()
            }
            AppError::SchemaParse { .. } => {
                "The language model returned an answer in an unexpected format.".to_string()
            }
            AppError::Cancelled { .. } => "The query was cancelled.".to_string(),
            other => format!("Something went wrong: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::IndexMismatch {
            expected: "all-minilm".into(),
            actual: "nomic-embed-text".into(),
        };
        assert_eq!(err.code(), ErrorCode::IndexMismatch);
        assert_eq!(err.code().as_code(), 2001);
    }

    #[test]
    fn test_query_errors_are_recoverable() {
        assert!(AppError::RetrievalTimeout { timeout_ms: 10 }.is_recoverable());
        assert!(AppError::ModelTimeout { timeout_ms: 10 }.is_recoverable());
        assert!(AppError::SchemaParse {
            raw: "{".into(),
            violation: "EOF".into(),
            attempts: 2,
        }
        .is_recoverable());
    }

    #[test]
    fn test_wrapped_errors_map_to_internal_codes() {
        let io = AppError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.code().as_code(), 9004);
        assert!(!io.is_recoverable());

        let other = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(other.code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_build_errors_are_fatal() {
        assert!(!AppError::EmptyCorpus.is_recoverable());
        assert!(!AppError::Configuration { message: "bad".into() }.is_recoverable());
    }

    #[test]
    fn test_model_timeout_is_distinguishable() {
        let timeout = AppError::ModelTimeout { timeout_ms: 500 };
        let failure = AppError::ModelInvocation { message: "refused".into() };
        assert!(timeout.is_model_failure());
        assert!(failure.is_model_failure());
        assert_ne!(timeout.code(), failure.code());
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::SchemaParseError).unwrap();
        assert_eq!(json, "\"SCHEMA_PARSE_ERROR\"");
    }
}
