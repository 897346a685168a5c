//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local API for both embeddings and chat.
//! Running models locally keeps clinical documents on the analyst's machine.
//!
//! # Features
//!
//! - Blocking HTTP communication with the Ollama API
//! - Configurable endpoint, embedding model and chat model
//! - Retry logic with exponential backoff
//! - Timeout handling
//!
//! # Examples
//!
//! ```no_run
//! use estima_llm::OllamaProvider;
//! use estima_domain::EmbeddingProvider;
//!
//! let provider = OllamaProvider::new(
//!     "http://localhost:11434",
//!     "oscardp96/medcpt-article",
//!     "gpt-oss",
//! ).unwrap();
//! let vector = provider.embed("Mean age was 41.2 years").unwrap();
//! ```

use crate::http::{build_client, send_json};
use crate::LlmError;
use estima_domain::{ChatMessage, ChatProvider, EmbeddingProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for provider requests (120 seconds; local generation is slow)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama API provider for local embeddings and chat
pub struct OllamaProvider {
    endpoint: String,
    embedding_model: String,
    chat_model: String,
    temperature: Option<f32>,
    client: reqwest::blocking::Client,
    max_retries: u32,
}

/// Request body for the Ollama embeddings API
#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from the Ollama embeddings API
#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

/// Request body for the Ollama chat API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response from the Ollama chat API
#[derive(Deserialize)]
struct ChatResponse {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint; a bare `host:port` gets an `http://` scheme
    /// - `embedding_model`: model used for `/api/embeddings`
    /// - `chat_model`: model used for `/api/chat`
    pub fn new(
        endpoint: impl Into<String>,
        embedding_model: impl Into<String>,
        chat_model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: normalize_endpoint(&endpoint.into()),
            embedding_model: embedding_model.into(),
            chat_model: chat_model.into(),
            temperature: None,
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the maximum number of attempts per request
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Set the sampling temperature passed as a model option
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Chat model name
    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }
}

impl EmbeddingProvider for OllamaProvider {
    type Error = LlmError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        let url = format!("{}/api/embeddings", self.endpoint);
        let body = EmbeddingsRequest {
            model: &self.embedding_model,
            prompt: text,
        };

        let response: EmbeddingsResponse = send_json(
            || self.client.post(&url).json(&body),
            &self.embedding_model,
            self.max_retries,
        )?;

        if response.embedding.is_empty() {
            return Err(LlmError::InvalidResponse(
                "Ollama returned an empty embedding".to_string(),
            ));
        }
        Ok(response.embedding)
    }

    fn model_id(&self) -> &str {
        &self.embedding_model
    }
}

impl ChatProvider for OllamaProvider {
    type Error = LlmError;

    fn chat(&self, messages: &[ChatMessage]) -> Result<String, Self::Error> {
        let url = format!("{}/api/chat", self.endpoint);
        let body = ChatRequest {
            model: &self.chat_model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options: self.temperature.map(|temperature| ChatOptions { temperature }),
        };

        let response: ChatResponse = send_json(
            || self.client.post(&url).json(&body),
            &self.chat_model,
            self.max_retries,
        )?;

        Ok(response.message.content)
    }
}

/// Accept `localhost:11434` as well as `http://localhost:11434/`
fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new(DEFAULT_ENDPOINT, "medcpt", "gpt-oss").unwrap();
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.embedding_model, "medcpt");
        assert_eq!(provider.chat_model(), "gpt-oss");
        assert_eq!(provider.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(provider.model_id(), "medcpt");
    }

    #[test]
    fn test_endpoint_normalization() {
        assert_eq!(normalize_endpoint("localhost:11434"), "http://localhost:11434");
        assert_eq!(normalize_endpoint("http://10.0.0.5:11434/"), "http://10.0.0.5:11434");
        assert_eq!(normalize_endpoint("https://ollama.example"), "https://ollama.example");
    }

    #[test]
    fn test_ollama_provider_with_max_retries() {
        let provider = OllamaProvider::new(DEFAULT_ENDPOINT, "e", "c")
            .unwrap()
            .with_max_retries(5);
        assert_eq!(provider.max_retries, 5);
    }

    #[test]
    fn test_ollama_error_handling() {
        // Use invalid endpoint to trigger error
        let provider = OllamaProvider::new("http://localhost:99999", "e", "c")
            .unwrap()
            .with_max_retries(1);

        let result = provider.chat(&[ChatMessage::user("test")]);
        match result {
            Err(LlmError::Communication(_)) => {} // Expected
            other => panic!("Expected Communication error, got {:?}", other.map(|_| ())),
        }
    }

    // Integration tests (requires running Ollama)
    #[test]
    #[ignore] // Only run when Ollama is available
    fn test_ollama_embed_integration() {
        let provider =
            OllamaProvider::new(DEFAULT_ENDPOINT, "oscardp96/medcpt-article", "gpt-oss").unwrap();
        let vector = provider.embed("Mean age was 41.2 years").unwrap();
        assert!(!vector.is_empty());
    }
}
