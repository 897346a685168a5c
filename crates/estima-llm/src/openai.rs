//! OpenAI-compatible Provider Implementation
//!
//! Talks to `/embeddings` and `/chat/completions` under a configurable base URL,
//! so any OpenAI-compatible gateway works as well as the hosted API.

use crate::http::{build_client, send_json};
use crate::LlmError;
use estima_domain::{ChatMessage, ChatProvider, EmbeddingProvider};
use reqwest::blocking::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Hosted OpenAI-compatible provider
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    embedding_model: String,
    embedding_dimension: Option<usize>,
    chat_model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::blocking::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider against [`DEFAULT_BASE_URL`]
    ///
    /// # Errors
    /// Returns `LlmError::Configuration` if `api_key` is blank
    pub fn new(
        api_key: impl Into<String>,
        embedding_model: impl Into<String>,
        chat_model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Configuration(
                "OPENAI_API_KEY is required when using the OpenAI provider".to_string(),
            ));
        }

        Ok(Self {
            api_key: api_key.trim().to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: embedding_model.into(),
            embedding_dimension: None,
            chat_model: chat_model.into(),
            temperature: 0.1,
            max_tokens: 2000,
            client: build_client(Duration::from_secs(60))?,
            max_retries: 3,
        })
    }

    /// Use a different OpenAI-compatible base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Request reduced-dimension embeddings
    pub fn with_embedding_dimension(mut self, dimension: Option<usize>) -> Self {
        self.embedding_dimension = dimension;
        self
    }

    /// Set sampling temperature and completion budget
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
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

    /// Chat model name
    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
    }
}

impl EmbeddingProvider for OpenAiProvider {
    type Error = LlmError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        let body = EmbeddingsRequest {
            model: &self.embedding_model,
            input: text,
            dimensions: self.embedding_dimension,
        };

        let response: EmbeddingsResponse = send_json(
            || self.post("embeddings").json(&body),
            &self.embedding_model,
            self.max_retries,
        )?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::InvalidResponse("No embedding in response".to_string()))
    }

    fn model_id(&self) -> &str {
        &self.embedding_model
    }
}

impl ChatProvider for OpenAiProvider {
    type Error = LlmError;

    fn chat(&self, messages: &[ChatMessage]) -> Result<String, Self::Error> {
        let body = ChatRequest {
            model: &self.chat_model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response: ChatResponse = send_json(
            || self.post("chat/completions").json(&body),
            &self.chat_model,
            self.max_retries,
        )?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;
        Ok(choice.message.content.unwrap_or_default())
    }
}
