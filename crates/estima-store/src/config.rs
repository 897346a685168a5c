//! Configuration for the vector index

use crate::StoreError;
use estima_domain::TextChunker;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to do when a persisted namespace no longer matches the documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Reuse the namespace and log a warning
    #[default]
    Warn,
    /// Drop the namespace contents and rebuild from scratch
    Rebuild,
    /// Refuse to continue
    Fail,
}

/// Configuration for a vector namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Namespace directory
    pub persist_dir: PathBuf,

    /// Maximum chunk size (characters)
    pub chunk_size: usize,

    /// Overlap between consecutive chunks (characters)
    pub chunk_overlap: usize,

    /// Handling of a namespace built from different inputs
    pub on_stale: StalePolicy,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            persist_dir: PathBuf::from("./chroma_db"),
            chunk_size: 1000,
            chunk_overlap: 200,
            on_stale: StalePolicy::Warn,
        }
    }
}

impl IndexConfig {
    /// Configuration for the namespace at `persist_dir` with default chunking
    pub fn at(persist_dir: impl Into<PathBuf>) -> Self {
        Self {
            persist_dir: persist_dir.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), StoreError> {
        self.chunker().map(|_| ())
    }

    /// Chunker for this configuration
    pub fn chunker(&self) -> Result<TextChunker, StoreError> {
        TextChunker::new(self.chunk_size, self.chunk_overlap).map_err(StoreError::Config)
    }
}
