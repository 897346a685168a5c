//! Error types for the Extractor

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during extraction and normalization
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Chat provider failed for one (document, field) pair
    #[error("LLM error for {document} / {field}: {message}")]
    Provider {
        /// Document being processed
        document: String,
        /// Field being extracted
        field: String,
        /// Provider error message
        message: String,
    },

    /// Retrieval failed for one (document, field) pair
    #[error("Retrieval error for {document} / {field}: {message}")]
    Retrieval {
        /// Document being processed
        document: String,
        /// Field being extracted
        field: String,
        /// Store error message
        message: String,
    },

    /// A pair exceeded the extraction timeout
    #[error("Extraction timeout after {secs}s for {document} / {field}")]
    Timeout {
        /// Document being processed
        document: String,
        /// Field being extracted
        field: String,
        /// Configured timeout
        secs: u64,
    },

    /// Worker task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(String),

    /// Checkpoint file could not be read or written
    #[error("Checkpoint error at {}: {message}", path.display())]
    Checkpoint {
        /// Checkpoint location
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}

impl ExtractorError {
    /// The (document, field) pair this error belongs to, if any
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self {
            ExtractorError::Provider {
                document, field, ..
            }
            | ExtractorError::Retrieval {
                document, field, ..
            }
            | ExtractorError::Timeout {
                document, field, ..
            } => Some((document, field)),
            _ => None,
        }
    }
}
