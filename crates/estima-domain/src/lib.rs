//! Estima Domain Layer
//!
//! This crate contains the core domain model for Estima. It has ZERO external
//! dependencies and defines the concepts and trait interfaces that every other
//! layer depends upon.
//!
//! ## Key Concepts
//!
//! - **Document**: a source text identified by its filename
//! - **Chunk**: a bounded, ordered slice of a document used for retrieval
//! - **Field**: a human-readable description of a datum to extract
//! - **Providers**: embedding and chat-completion interfaces implemented elsewhere
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Pure logic only (the chunker is a pure function of text and config)
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunking;
pub mod document;
pub mod field;
pub mod traits;

// Re-exports for convenience
pub use chunking::TextChunker;
pub use document::{Chunk, Document};
pub use field::Field;
pub use traits::{ChatMessage, ChatProvider, EmbeddingProvider, Role};
