//! Error types for the streaming client.
//!
//! The reveal buffer itself never fails; everything here comes from the
//! network side or from talking to a reveal actor that has already exited.

use thiserror::Error;

/// A result type using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while requesting or consuming a stream.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP request or a body read failed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error detail extracted from the response body, if any.
        message: String,
    },

    /// The event-stream framing itself could not be decoded.
    #[error("malformed event stream: {0}")]
    Stream(String),

    /// The backend sent an error record in place of content.
    #[error("server error: {0}")]
    Server(String),

    /// A JSON body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The reveal actor has shut down and no longer accepts commands.
    #[error("reveal actor is no longer running")]
    ActorGone,
}

impl Error {
    /// Returns `true` if resubmitting the same request may succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Server(_) | Self::Stream(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) | Self::Config(_) | Self::ActorGone => false,
        }
    }
}
