//! Ingestion error types

use citewise_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error for {path}: {message}")]
    PdfParseError { path: String, message: String },

    #[error("Corpus directory not found: {0}")]
    CorpusNotFound(String),

    #[error("No loadable documents under {0}")]
    NoDocuments(String),

    #[error("Chunking error: {0}")]
    ChunkingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] AppError),
}

impl IngestionError {
    /// Error code shared with the rest of the pipeline
    pub fn code(&self) -> citewise_common::errors::ErrorCode {
        use citewise_common::errors::ErrorCode;
        match self {
            IngestionError::PdfParseError { .. }
            | IngestionError::CorpusNotFound(_)
            | IngestionError::NoDocuments(_) => ErrorCode::DocumentLoadError,
            IngestionError::ChunkingError(_) => ErrorCode::ConfigurationError,
            IngestionError::IoError(_) => ErrorCode::IoError,
            IngestionError::Common(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citewise_common::errors::ErrorCode;

    #[test]
    fn test_common_error_keeps_code() {
        let err = IngestionError::from(AppError::EmptyCorpus);
        assert_eq!(err.code(), ErrorCode::EmptyCorpus);
    }

    #[test]
    fn test_load_errors_share_code() {
        assert_eq!(
            IngestionError::NoDocuments("/tmp".into()).code(),
            ErrorCode::DocumentLoadError
        );
    }
}
