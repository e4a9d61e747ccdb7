//! HTTP client for the chat backend.
//!
//! Two streaming endpoints plus the JSON endpoints for stored conversations:
//!
//! | Method | Path                            | Body              |
//! |--------|---------------------------------|-------------------|
//! | GET    | `/llama/chat?q=<query>`         | plain text chunks |
//! | POST   | `/chat/chat-stream`             | `data: <json>`    |
//! | GET    | `/chat/chat-history/<thread>`   | JSON transcript   |
//! | GET    | `/chat/conversations`           | JSON listing      |
//! | POST   | `/chat/conversations`           | JSON conversation |
//! | DELETE | `/chat/conversations/<thread>`  | empty             |

mod types;

pub use types::{
    ChatHistory, ChatMessage, ChatStreamPayload, Conversation, ConversationList, NewConversation,
    Role,
};

use crate::error::{Error, Result};
use crate::transport::{event_fragments, text_fragments, FragmentStream};
use reqwest::{Client, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::debug;
use types::ApiErrorResponse;

/// Configuration for the chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL.
    pub base_url: String,
    /// Bearer token for authenticated endpoints.
    pub token: Option<String>,
    /// Connection timeout. Streams themselves have no overall deadline.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the chat backend.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ChatClient {
    /// Create a new chat client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|err| Error::Config(format!("base URL {base_url:?}: {err}")))?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: config.token.filter(|token| !token.is_empty()),
        })
    }

    /// Stream a plain-text completion for `query`.
    pub async fn stream_text(&self, query: &str) -> Result<FragmentStream> {
        let url = format!("{}/llama/chat", self.base_url);
        debug!(%url, "requesting text stream");

        let response = self
            .authorize(self.client.get(&url).query(&[("q", query)]))
            .send()
            .await?;
        let response = Self::check(response).await?;

        Ok(text_fragments(response.bytes_stream()))
    }

    /// Stream a chat completion as `data: <json>` records.
    pub async fn stream_chat(&self, payload: &ChatStreamPayload) -> Result<FragmentStream> {
        let url = format!("{}/chat/chat-stream", self.base_url);
        debug!(%url, thread_id = %payload.thread_id, "requesting chat stream");

        let response = self
            .authorize(self.client.post(&url).json(payload))
            .send()
            .await?;
        let response = Self::check(response).await?;

        Ok(event_fragments(response.bytes_stream()))
    }

    /// Fetch the stored transcript of a conversation.
    pub async fn chat_history(&self, thread_id: &str) -> Result<ChatHistory> {
        let url = format!("{}/chat/chat-history/{}", self.base_url, thread_id);

        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = Self::check(response).await?;

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// List the caller's stored conversations.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let url = format!("{}/chat/conversations", self.base_url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = Self::check(response).await?;

        let body = response.bytes().await?;
        let list: ConversationList = serde_json::from_slice(&body)?;
        Ok(list.conversations)
    }

    /// Register a conversation under `request.thread_id`.
    pub async fn create_conversation(&self, request: &NewConversation) -> Result<Conversation> {
        let url = format!("{}/chat/conversations", self.base_url);
        debug!(thread_id = %request.thread_id, "creating conversation");

        let response = self
            .authorize(self.client.post(&url).json(request))
            .send()
            .await?;
        let response = Self::check(response).await?;

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Delete a conversation and its stored messages.
    pub async fn delete_conversation(&self, thread_id: &str) -> Result<()> {
        let url = format!("{}/chat/conversations/{}", self.base_url, thread_id);
        debug!(thread_id, "deleting conversation");

        let response = self.authorize(self.client.delete(&url)).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-success response into [`Error::Status`].
    async fn check(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(ApiErrorResponse { detail: serde_json::Value::String(detail) }) => detail,
            Ok(ApiErrorResponse { detail }) => detail.to_string(),
            Err(_) if body.is_empty() => "Unknown error".to_string(),
            Err(_) => body,
        };

        Err(Error::Status { status, message })
    }
}
