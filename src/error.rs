//! Engine error kinds
//!
//! `InvalidInput` and `CorpusLoad` are surfaced to callers. The other two kinds
//! never escape `Engine::analyze`: they are absorbed and show up as reduced
//! method coverage or as indicators on the final result.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the detection engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to load corpus {}: {message}", path.display())]
    CorpusLoad { path: PathBuf, message: String },

    #[error("external service unavailable: {0}")]
    ExternalServiceUnavailable(String),

    #[error("extraction degraded: {0}")]
    ExtractionDegraded(String),
}

impl EngineError {
    pub fn corpus(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        EngineError::CorpusLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidInput(_) => ErrorKind::InvalidInput,
            EngineError::CorpusLoad { .. } => ErrorKind::CorpusLoadError,
            EngineError::ExternalServiceUnavailable(_) => ErrorKind::ExternalServiceUnavailable,
            EngineError::ExtractionDegraded(_) => ErrorKind::ExtractionDegraded,
        }
    }

    /// Structured error object for the engine boundary
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    CorpusLoadError,
    ExternalServiceUnavailable,
    ExtractionDegraded,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "invalid_input"),
            ErrorKind::CorpusLoadError => write!(f, "corpus_load_error"),
            ErrorKind::ExternalServiceUnavailable => write!(f, "external_service_unavailable"),
            ErrorKind::ExtractionDegraded => write!(f, "extraction_degraded"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_report_shape() {
        let err = EngineError::InvalidInput("code is empty".into());
        let json = serde_json::to_value(err.report()).unwrap();
        assert_eq!(json["kind"], "invalid_input");
        assert_eq!(json["message"], "invalid input: code is empty");
    }

    #[test]
    fn test_corpus_error_names_path() {
        let err = EngineError::corpus("/data/corpus.jsonl", "row 3: missing code");
        assert_eq!(err.kind(), ErrorKind::CorpusLoadError);
        assert!(err.to_string().contains("/data/corpus.jsonl"));
        assert!(err.to_string().contains("row 3"));
    }
}
