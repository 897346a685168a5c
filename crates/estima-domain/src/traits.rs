//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

/// Trait for turning text into embedding vectors
///
/// Implemented by the infrastructure layer (estima-llm)
pub trait EmbeddingProvider {
    /// Error type for embedding operations
    type Error;

    /// Embed a document chunk
    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error>;

    /// Embed a retrieval query
    ///
    /// Some models use a different instruction for queries than for passages.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        self.embed(text)
    }

    /// Identifier of the embedding model, recorded alongside persisted vectors
    fn model_id(&self) -> &str;
}

/// Trait for chat-completion operations
///
/// Implemented by the infrastructure layer (estima-llm)
pub trait ChatProvider {
    /// Error type for chat operations
    type Error;

    /// Send an ordered conversation and return the assistant's reply text
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, Self::Error>;
}

/// Author of a chat message
///
/// Extraction prompts are single user turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// End-user turn
    User,
}

impl Role {
    /// Wire name shared by the supported chat APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Message author
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_wire_role() {
        let message = ChatMessage::user("Extract mean age");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.role.as_str(), "user");
        assert_eq!(message.content, "Extract mean age");
    }
}
