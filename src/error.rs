//! Error types for the reranking pipeline
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for retrieval and reranking operations
#[derive(Error, Debug)]
pub enum RerankError {
    /// Configuration errors are fatal before the first query runs
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    #[error("Unknown similarity measure '{name}'. Known measures: {known}")]
    UnknownMeasure { name: String, known: String },

    /// Embedding lexicon could not be initialized
    #[error("Failed to load word embeddings from '{}': {reason}", path.display())]
    EmbeddingsUnavailable { path: PathBuf, reason: String },

    /// File system errors
    #[error("Failed to read file '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{}': {source}", path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Lexical index errors
    #[error("Lexical index operation failed during {operation}: {cause}")]
    LexicalError { operation: String, cause: String },

    #[error("Malformed query line {line} in '{}': expected 'id<TAB>text'", path.display())]
    QueryFileFormat { path: PathBuf, line: usize },

    /// Stored centroid payload could not be decoded
    #[error("Corrupt stored centroid payload for document '{docid}': {reason}")]
    CorruptCentroids { docid: String, reason: String },

    /// General errors for cases where we need to preserve context from below
    #[error("{0}")]
    General(String),
}

impl RerankError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier usable in scripted output for
    /// programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::UnknownMeasure { .. } => "UNKNOWN_MEASURE",
            Self::EmbeddingsUnavailable { .. } => "EMBEDDINGS_UNAVAILABLE",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::LexicalError { .. } => "LEXICAL_ERROR",
            Self::QueryFileFormat { .. } => "QUERY_FILE_FORMAT",
            Self::CorruptCentroids { .. } => "CORRUPT_CENTROIDS",
            Self::General(_) => "GENERAL_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::EmbeddingsUnavailable { .. } => vec![
                "Check embeddings.path in settings.toml",
                "The file must contain one 'word v1 v2 ... vd' line per word",
            ],
            Self::LexicalError { .. } => vec![
                "Try running 'vecrank index --force' to rebuild the index",
                "Check disk space and permissions in the index directory",
            ],
            Self::CorruptCentroids { .. } => vec![
                "Rebuild the index with 'vecrank index --force'",
                "Check that indexing.compress matches the setting used at index time",
            ],
            Self::UnknownMeasure { .. } => {
                vec!["Set rerank.measure to one of the names listed above"]
            }
            _ => vec![],
        }
    }
}

impl From<tantivy::TantivyError> for RerankError {
    fn from(e: tantivy::TantivyError) -> Self {
        Self::LexicalError {
            operation: "index access".to_string(),
            cause: e.to_string(),
        }
    }
}

impl From<tantivy::directory::error::OpenDirectoryError> for RerankError {
    fn from(e: tantivy::directory::error::OpenDirectoryError) -> Self {
        Self::LexicalError {
            operation: "open index directory".to_string(),
            cause: e.to_string(),
        }
    }
}

/// Result type alias for retrieval and reranking operations
pub type RerankResult<T> = Result<T, RerankError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T, RerankError>;

    /// Add context with a path
    fn with_path(self, path: &std::path::Path) -> Result<T, RerankError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> Result<T, RerankError> {
        self.map_err(|e| RerankError::General(format!("{msg}: {e}")))
    }

    fn with_path(self, path: &std::path::Path) -> Result<T, RerankError> {
        self.map_err(|e| {
            RerankError::General(format!("Error processing '{}': {}", path.display(), e))
        })
    }
}
