//! Chat session: request handling around one reveal actor.
//!
//! The session owns the transcript and the loading/error flags. Each
//! submit resets the reveal actor, streams the reply into it fragment by
//! fragment, and mirrors the accumulated reply into the transcript.

use crate::actor::RevealHandle;
use crate::client::{ChatClient, ChatMessage, ChatStreamPayload, Role};
use crate::error::Result;
use crate::transport::FragmentStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Settings for the event-stream chat endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    /// Model identifier.
    pub model_name: String,
    /// System prompt; empty for none.
    pub system_message: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Conversation to append to; empty starts a new one server-side.
    pub thread_id: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model_name: "gpt-3.5-turbo".to_string(),
            system_message: String::new(),
            temperature: 0.7,
            thread_id: String::new(),
        }
    }
}

impl ChatSettings {
    fn payload(&self, prompt: &str) -> ChatStreamPayload {
        ChatStreamPayload {
            prompt: prompt.to_string(),
            model_name: self.model_name.clone(),
            system_message: self.system_message.clone(),
            temperature: self.temperature,
            thread_id: self.thread_id.clone(),
        }
    }
}

/// Which endpoint a session talks to.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Plain-text stream; the prompt is sent as the query.
    Text,
    /// Event-stream chat with model settings.
    Chat(ChatSettings),
}

/// How a submit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The prompt was blank; nothing was sent.
    Empty,
    /// The stream ran to its end.
    Completed,
    /// The cancellation token fired; the reply stopped growing.
    Cancelled,
}

/// A conversation driven through one reveal actor.
pub struct ChatSession {
    client: ChatClient,
    reveal: RevealHandle,
    mode: Mode,
    messages: Vec<ChatMessage>,
    loading: bool,
    error: Option<String>,
    last_prompt: Option<String>,
    next_id: u64,
}

impl ChatSession {
    /// Create a session with an empty transcript.
    pub const fn new(client: ChatClient, reveal: RevealHandle, mode: Mode) -> Self {
        Self {
            client,
            reveal,
            mode,
            messages: Vec::new(),
            loading: false,
            error: None,
            last_prompt: None,
            next_id: 1,
        }
    }

    /// The transcript so far.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Check if a request is in flight.
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// User-visible message for the last failed request.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Send a prompt and stream the reply into the reveal actor.
    ///
    /// The reveal actor is reset before the request so a new reply never
    /// mixes with stale text. Cancelling `cancel` stops consuming the body;
    /// what was received stays in the transcript and no error is recorded.
    pub async fn submit(&mut self, prompt: &str, cancel: &CancellationToken) -> Result<SubmitOutcome> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(SubmitOutcome::Empty);
        }

        self.reveal.reset()?;
        self.loading = true;
        self.error = None;

        let user_id = self.next_id.to_string();
        self.next_id += 1;
        self.messages.push(ChatMessage::new(user_id.as_str(), Role::User, prompt));
        self.last_prompt = Some(prompt.to_string());

        let assistant_id = format!("ai-{user_id}");
        let result = self.stream_reply(prompt, &assistant_id, cancel).await;
        self.loading = false;

        if let Err(err) = &result {
            warn!(%err, "chat stream failed");
            self.error = Some(format!("Failed to get response: {err}"));
        }
        result
    }

    /// Clear the error and resubmit the last prompt.
    pub async fn retry(&mut self, cancel: &CancellationToken) -> Result<SubmitOutcome> {
        self.error = None;
        let Some(prompt) = self.last_prompt.clone() else {
            return Ok(SubmitOutcome::Empty);
        };
        self.submit(&prompt, cancel).await
    }

    /// Replace the transcript with the stored one for `thread_id`.
    pub async fn load_history(&mut self, thread_id: &str) -> Result<()> {
        let history = self.client.chat_history(thread_id).await?;
        debug!(thread_id, messages = history.messages.len(), "history loaded");
        self.messages = history.messages;
        Ok(())
    }

    async fn open_stream(&self, prompt: &str) -> Result<FragmentStream> {
        match &self.mode {
            Mode::Text => self.client.stream_text(prompt).await,
            Mode::Chat(settings) => self.client.stream_chat(&settings.payload(prompt)).await,
        }
    }

    async fn stream_reply(
        &mut self,
        prompt: &str,
        assistant_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SubmitOutcome> {
        let mut fragments = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(SubmitOutcome::Cancelled),
            fragments = self.open_stream(prompt) => fragments?,
        };

        let mut reply = String::new();
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(bytes = reply.len(), "stream cancelled");
                    return Ok(SubmitOutcome::Cancelled);
                }
                next = fragments.next() => next,
            };

            let Some(fragment) = next else { break };
            let fragment = fragment?;

            self.reveal.append(fragment.as_str())?;
            reply.push_str(&fragment);
            upsert_message(&mut self.messages, assistant_id, &reply);
        }

        debug!(bytes = reply.len(), "stream completed");
        Ok(SubmitOutcome::Completed)
    }
}

/// Set the content of the message with `id`, or append a new assistant
/// message if there is none.
pub fn upsert_message(messages: &mut Vec<ChatMessage>, id: &str, content: &str) {
    match messages.iter_mut().find(|message| message.id == id) {
        Some(message) => content.clone_into(&mut message.content),
        None => messages.push(ChatMessage::new(id, Role::Assistant, content)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{RevealActor, RevealConfig, RevealUpdate};
    use crate::client::ClientConfig;
    use crate::error::Error;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_actor() -> RevealActor {
        RevealActor::spawn(RevealConfig {
            period: Duration::from_millis(1),
            ..RevealConfig::default()
        })
    }

    fn session(server: &MockServer, actor: &RevealActor, mode: Mode) -> ChatSession {
        let client = ChatClient::new(ClientConfig {
            base_url: server.uri(),
            ..ClientConfig::default()
        })
        .unwrap();
        ChatSession::new(client, actor.handle(), mode)
    }

    fn last_visible(actor: &RevealActor) -> String {
        let mut visible = String::new();
        loop {
            match actor.updates().recv_timeout(Duration::from_secs(2)).unwrap() {
                RevealUpdate::Visible(text) => visible = text,
                RevealUpdate::CaughtUp => return visible,
            }
        }
    }

    #[test]
    fn test_upsert_message() {
        let mut messages = vec![ChatMessage::new("1", Role::User, "hi")];
        upsert_message(&mut messages, "ai-1", "Hel");
        upsert_message(&mut messages, "ai-1", "Hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], ChatMessage::new("ai-1", Role::Assistant, "Hello"));
    }

    #[tokio::test]
    async fn test_submit_text_mode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/llama/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Hello"))
            .mount(&server)
            .await;

        let actor = fast_actor();
        let mut session = session(&server, &actor, Mode::Text);
        let outcome = session.submit("  hi  ", &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Completed);
        assert!(!session.is_loading());
        assert_eq!(session.messages()[0], ChatMessage::new("1", Role::User, "hi"));
        assert_eq!(session.messages()[1], ChatMessage::new("ai-1", Role::Assistant, "Hello"));

        // The reset published before the request, then the reveal.
        assert_eq!(actor.updates().recv().unwrap(), RevealUpdate::Visible(String::new()));
        assert_eq!(last_visible(&actor), "Hello");
    }

    #[tokio::test]
    async fn test_blank_prompt_sends_nothing() {
        let server = MockServer::start().await;
        let actor = fast_actor();
        let mut session = session(&server, &actor, Mode::Text);

        let outcome = session.submit("   ", &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Empty);
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_error_then_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/chat-stream"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "down"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/chat-stream"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("data: {\"content\": \"back\"}\n\n"),
            )
            .mount(&server)
            .await;

        let actor = fast_actor();
        let mut session = session(&server, &actor, Mode::Chat(ChatSettings::default()));
        let cancel = CancellationToken::new();

        let err = session.submit("ping", &cancel).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 500, .. }));
        assert_eq!(session.error(), Some("Failed to get response: API error (500): down"));
        assert!(!session.is_loading());

        let outcome = session.retry(&cancel).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Completed);
        assert_eq!(session.error(), None);
        assert_eq!(session.messages().last().unwrap().content, "back");
        assert_eq!(last_visible(&actor), "back");
    }

    #[tokio::test]
    async fn test_cancel_while_waiting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/llama/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("too late")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let actor = fast_actor();
        let mut session = session(&server, &actor, Mode::Text);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let outcome = session.submit("hi", &cancel).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Cancelled);
        assert_eq!(session.error(), None);
        assert!(!session.is_loading());
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_load_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chat/chat-history/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{"id": "m1", "role": "assistant", "content": "earlier"}]
            })))
            .mount(&server)
            .await;

        let actor = fast_actor();
        let mut session = session(&server, &actor, Mode::Text);
        session.load_history("abc").await.unwrap();
        assert_eq!(session.messages()[0].content, "earlier");
    }
}
