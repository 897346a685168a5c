//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider error
    #[error(transparent)]
    Llm(#[from] estima_llm::LlmError),

    /// Vector index error
    #[error("Index error: {0}")]
    Store(#[from] estima_store::StoreError),

    /// Extraction or normalization error
    #[error("Extraction error: {0}")]
    Extractor(#[from] estima_extractor::ExtractorError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Background task failed to complete
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
