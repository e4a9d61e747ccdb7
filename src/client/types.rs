//! Wire types shared with the chat backend.

use serde::{Deserialize, Deserializer, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing.
    User,
    /// The model.
    Assistant,
    /// A system prompt stored alongside the conversation.
    System,
}

/// One message in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identifier; the backend sends strings, older builds numbers.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Who wrote it.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a message.
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
        }
    }
}

/// Body of a chat-stream request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatStreamPayload {
    /// The user's prompt.
    pub prompt: String,
    /// Model identifier, e.g. `gpt-3.5-turbo`.
    pub model_name: String,
    /// System prompt; empty for none.
    pub system_message: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Conversation the prompt belongs to.
    pub thread_id: String,
}

/// A stored conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChatHistory {
    /// Messages in order.
    pub messages: Vec<ChatMessage>,
}

/// Summary of one stored conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Thread identifier used by the chat endpoints.
    pub thread_id: String,
    /// Display title; the backend derives it from the first prompt.
    pub title: String,
    /// Creation timestamp as sent by the backend (ISO 8601).
    pub created_at: String,
    /// Timestamp of the latest message, if the backend tracks it.
    #[serde(default)]
    pub last_message_at: Option<String>,
    /// Number of stored messages.
    #[serde(default)]
    pub message_count: u32,
}

/// Response body of the conversation listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ConversationList {
    /// Conversations owned by the caller.
    pub conversations: Vec<Conversation>,
}

/// Body of a create-conversation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewConversation {
    /// Display title.
    pub title: String,
    /// Thread identifier to register.
    pub thread_id: String,
}

/// Error body returned by the backend on failure.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub detail: serde_json::Value,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}
