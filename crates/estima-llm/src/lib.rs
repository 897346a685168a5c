//! Estima LLM Provider Layer
//!
//! Pluggable embedding and chat-completion providers implementing the
//! `EmbeddingProvider` and `ChatProvider` traits from `estima-domain`.
//!
//! # Providers
//!
//! - `OllamaProvider`: local Ollama API (`/api/embeddings`, `/api/chat`)
//! - `OpenAiProvider`: hosted OpenAI-compatible API (`/embeddings`, `/chat/completions`)
//! - `Provider`: the variant selected from `ProviderConfig` at startup
//! - `MockProvider` / `MockEmbedder`: deterministic doubles for testing
//!
//! # Examples
//!
//! ```
//! use estima_llm::MockProvider;
//! use estima_domain::{ChatMessage, ChatProvider};
//!
//! let provider = MockProvider::new("{}");
//! let reply = provider.chat(&[ChatMessage::user("Extract mean age")]).unwrap();
//! assert_eq!(reply, "{}");
//! ```

#![warn(missing_docs)]

pub mod config;
mod http;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;

use thiserror::Error;

pub use config::{ProviderConfig, ProviderKind};
pub use mock::{MockEmbedder, MockProvider};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::Provider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Credentials rejected by the provider
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Invalid or missing provider configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}
