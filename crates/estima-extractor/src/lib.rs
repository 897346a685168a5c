//! Estima Extractor
//!
//! Retrieval-augmented extraction of clinical-trial fields, and the
//! normalization of raw model answers into tables.
//!
//! # Architecture
//!
//! ```text
//! (document, field) → VectorIndex::search → prompt → ChatProvider
//!                   → ExtractionRecord → checkpoint → wide / long tables
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use estima_domain::{Document, Field};
//! use estima_extractor::{normalize, Extractor, ExtractorConfig};
//! use estima_llm::{MockEmbedder, MockProvider};
//! use estima_store::{IndexConfig, VectorIndex};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let documents = vec![Document::new("trial.txt", "We randomized 248 patients.")];
//! let index = VectorIndex::in_memory(IndexConfig::default(), Arc::new(MockEmbedder::new(64)))?;
//! index.build(&documents)?;
//!
//! let chat = MockProvider::new(r#"{"sample_size": 248}"#);
//! let extractor = Extractor::new(Arc::new(index), Arc::new(chat), ExtractorConfig::default())?;
//!
//! let fields = vec![Field::new("sample size")?];
//! let report = extractor.extract(&documents, &fields).await?;
//!
//! let wide = normalize::wide_table(&report.results);
//! println!("{}", wide.to_csv_string()?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod checkpoint;
mod config;
mod error;
mod extractor;
pub mod flatten;
pub mod normalize;
mod prompt;
mod table;
mod types;

#[cfg(test)]
mod tests;

pub use checkpoint::Checkpoint;
pub use config::{ExtractorConfig, DEFAULT_FIELDS};
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use normalize::NormalizedAnswer;
pub use table::Table;
pub use types::{ExtractionFailure, ExtractionRecord, ExtractionReport, ExtractionResults};
