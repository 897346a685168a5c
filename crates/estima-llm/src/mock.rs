//! Deterministic provider doubles for testing
//!
//! Neither type makes network calls. `MockEmbedder` produces bag-of-words
//! vectors, so texts sharing vocabulary score as similar, which is enough to
//! exercise retrieval ordering without a real model.

use crate::LlmError;
use estima_domain::{ChatMessage, ChatProvider, EmbeddingProvider};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error,
}

/// Mock chat provider
///
/// Replies are chosen by the first registered needle contained in the last
/// message of the conversation; otherwise the default response is returned.
///
/// # Examples
///
/// ```
/// use estima_llm::MockProvider;
/// use estima_domain::{ChatMessage, ChatProvider};
///
/// let mut provider = MockProvider::default();
/// provider.add_response("sample size", r#"{"sample_size": 248}"#);
///
/// let reply = provider.chat(&[ChatMessage::user("Extract sample size from ...")]).unwrap();
/// assert_eq!(reply, r#"{"sample_size": 248}"#);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, Reply)>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply with `response` whenever the prompt contains `needle`
    pub fn add_response(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.lock_responses()
            .push((needle.into(), Reply::Text(response.into())));
    }

    /// Fail whenever the prompt contains `needle`
    pub fn add_error(&mut self, needle: impl Into<String>) {
        self.lock_responses().push((needle.into(), Reply::Error));
    }

    /// Number of chat calls made so far
    pub fn call_count(&self) -> usize {
        self.lock_prompts().len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.lock_prompts().clone()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, Vec<(String, Reply)>> {
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_prompts(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl ChatProvider for MockProvider {
    type Error = LlmError;

    fn chat(&self, messages: &[ChatMessage]) -> Result<String, Self::Error> {
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.lock_prompts().push(prompt.clone());

        let responses = self.lock_responses();
        match responses.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
            Some((_, Reply::Text(text))) => Ok(text.clone()),
            Some((_, Reply::Error)) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }
}

/// Mock embedding model
///
/// Each lowercase alphanumeric token is hashed into one of `dimension`
/// buckets; the resulting counts are normalized to unit length.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimension: usize,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockEmbedder {
    /// Create a new mock embedder
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// An embedder whose every call fails, simulating an unreachable service
    pub fn unavailable(dimension: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(dimension)
        }
    }

    /// Number of embed calls made so far (shared between clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }
}

impl EmbeddingProvider for MockEmbedder {
    type Error = LlmError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LlmError::Communication("Mock embedder unavailable".to_string()));
        }
        if text.trim().is_empty() {
            return Err(LlmError::Other("Empty text cannot be embedded".to_string()));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            embedding[self.bucket(&token.to_lowercase())] += 1.0;
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn model_id(&self) -> &str {
        "mock-bag-of-words"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.chat(&[ChatMessage::user("any prompt")]);
        assert_eq!(result.unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.chat(&[ChatMessage::user("say hello")]).unwrap(), "world");
        assert_eq!(provider.chat(&[ChatMessage::user("foo?")]).unwrap(), "bar");
        assert_eq!(provider.chat(&[ChatMessage::user("unknown")]).unwrap(), "{}");
    }

    #[test]
    fn test_mock_provider_records_prompts() {
        let provider = MockProvider::new("x");
        assert_eq!(provider.call_count(), 0);

        provider.chat(&[ChatMessage::user("prompt1")]).unwrap();
        provider.chat(&[ChatMessage::user("prompt2")]).unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2"]);
    }

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.chat(&[ChatMessage::user("a bad prompt")]);
        assert!(matches!(result.unwrap_err(), LlmError::Other(_)));
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.chat(&[ChatMessage::user("test")]).unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_mock_embedding_deterministic_and_normalized() {
        let model = MockEmbedder::new(64);
        let a = model.embed("Mean age was 41 years").unwrap();
        let b = model.embed("Mean age was 41 years").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-4);
        assert_eq!(model.call_count(), 2);
    }

    #[test]
    fn test_mock_embedding_shared_vocabulary_scores_higher() {
        let model = MockEmbedder::new(256);
        let query = model.embed_query("mean age").unwrap();
        let related = model.embed("The mean age of patients was 41").unwrap();
        let unrelated = model.embed("Adverse events were rare").unwrap();

        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn test_mock_embedding_failures() {
        let model = MockEmbedder::new(8);
        assert!(model.embed("   ").is_err());

        let down = MockEmbedder::unavailable(8);
        assert!(matches!(down.embed("text"), Err(LlmError::Communication(_))));
    }
}
