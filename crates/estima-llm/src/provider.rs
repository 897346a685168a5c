//! Startup-resolved provider
//!
//! The configured backend is resolved once into a `Provider` value that is
//! handed explicitly to the index and the extractor.

use crate::config::{ProviderConfig, ProviderKind};
use crate::{LlmError, OllamaProvider, OpenAiProvider};
use estima_domain::{ChatMessage, ChatProvider, EmbeddingProvider};
use std::time::Duration;
use tracing::info;

/// The embedding + chat backend selected by configuration
pub enum Provider {
    /// Local Ollama server
    Ollama(OllamaProvider),
    /// Hosted OpenAI-compatible API
    OpenAi(OpenAiProvider),
}

impl Provider {
    /// Validate `config` and construct the selected provider
    ///
    /// # Errors
    /// `LlmError::Configuration` for invalid settings or a missing credential
    pub fn from_config(config: &ProviderConfig) -> Result<Self, LlmError> {
        config.validate()?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let provider = match config.provider {
            ProviderKind::Ollama => Provider::Ollama(
                OllamaProvider::new(
                    &config.ollama_url,
                    config.embeddings_model(),
                    config.gen_model(),
                )?
                .with_timeout(timeout)?
                .with_temperature(config.temperature)
                .with_max_retries(config.max_retries),
            ),
            ProviderKind::OpenAi => {
                let api_key = config.openai_api_key.clone().unwrap_or_default();
                Provider::OpenAi(
                    OpenAiProvider::new(api_key, config.embeddings_model(), config.gen_model())?
                        .with_base_url(&config.openai_base_url)
                        .with_embedding_dimension(config.embeddings_dimension)
                        .with_sampling(config.temperature, config.max_tokens)
                        .with_timeout(timeout)?
                        .with_max_retries(config.max_retries),
                )
            }
        };

        info!(
            provider = config.provider.as_str(),
            embeddings_model = config.embeddings_model(),
            gen_model = config.gen_model(),
            "Provider configured"
        );
        Ok(provider)
    }

    /// Which backend this is
    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Ollama(_) => ProviderKind::Ollama,
            Provider::OpenAi(_) => ProviderKind::OpenAi,
        }
    }

    /// Chat model name
    pub fn chat_model(&self) -> &str {
        match self {
            Provider::Ollama(p) => p.chat_model(),
            Provider::OpenAi(p) => p.chat_model(),
        }
    }
}

impl EmbeddingProvider for Provider {
    type Error = LlmError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        match self {
            Provider::Ollama(p) => p.embed(text),
            Provider::OpenAi(p) => p.embed(text),
        }
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        match self {
            Provider::Ollama(p) => p.embed_query(text),
            Provider::OpenAi(p) => p.embed_query(text),
        }
    }

    fn model_id(&self) -> &str {
        match self {
            Provider::Ollama(p) => p.model_id(),
            Provider::OpenAi(p) => p.model_id(),
        }
    }
}

impl ChatProvider for Provider {
    type Error = LlmError;

    fn chat(&self, messages: &[ChatMessage]) -> Result<String, Self::Error> {
        match self {
            Provider::Ollama(p) => p.chat(messages),
            Provider::OpenAi(p) => p.chat(messages),
        }
    }
}
