//! Estima Storage Layer
//!
//! Persists chunk embeddings for a set of documents and serves per-document
//! similarity search over them.
//!
//! # Architecture
//!
//! - One SQLite file per namespace directory (`<persist_dir>/index.sqlite3`)
//! - A namespace is built in a single transaction: it is either absent or
//!   fully present, never half-built
//! - A manifest row records a fingerprint of the indexed document set so a
//!   reused namespace can be detected as stale
//! - Exact cosine scoring over one document's chunks (documents hold tens of
//!   chunks, so no approximate index is needed)
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use estima_domain::Document;
//! use estima_llm::MockEmbedder;
//! use estima_store::{IndexConfig, VectorIndex};
//!
//! let index = VectorIndex::open(IndexConfig::default(), Arc::new(MockEmbedder::new(384))).unwrap();
//! index.build(&[Document::new("trial.txt", "Mean age was 41.2 years.")]).unwrap();
//! let hits = index.search("mean age", "trial.txt", 5).unwrap();
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod embedding;
pub mod vector_index;

use thiserror::Error;

pub use config::{IndexConfig, StalePolicy};
pub use vector_index::{
    BuildOutcome, Manifest, RetrievedChunk, VectorIndex, DEFAULT_TOP_K, INDEX_FILE,
};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error while preparing the namespace directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding provider failure
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// Invalid index configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Vectors of different lengths in one namespace
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Namespace was built from a different document set or model
    #[error("Namespace at {0} is stale; rebuild it or set on_stale = \"warn\"")]
    StaleNamespace(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Connection lock poisoned
    #[error("Store lock error: {0}")]
    Lock(String),
}
