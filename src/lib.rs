//! # Smoothstream
//!
//! Bounded-rate reveal of streamed LLM text.
//!
//! Chat backends deliver replies in uneven bursts. Smoothstream keeps the
//! full text in a buffer and reveals it to the UI one character per tick,
//! so the visible reply grows at a steady pace regardless of how the
//! network delivers it.
//!
//! ## Core Concepts
//!
//! - **Reveal buffer**: append-only stream buffer with a trailing cursor
//! - **Reveal actor**: one thread per stream owning the buffer and its timer
//! - **Fragment streams**: plain-text or `data: <json>` bodies as async streams
//! - **Chat session**: submit, cancel, and retry around one reveal actor
//!
//! ## Example
//!
//! ```rust,ignore
//! use smoothstream::{RevealActor, RevealConfig, RevealUpdate};
//!
//! let actor = RevealActor::spawn(RevealConfig::default());
//! actor.append("Hello, ")?;
//! actor.append("world!")?;
//!
//! while let Ok(update) = actor.updates().recv() {
//!     match update {
//!         RevealUpdate::Visible(text) => println!("{text}"),
//!         RevealUpdate::CaughtUp => break,
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod client;
pub mod error;
pub mod reveal;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use actor::{RevealActor, RevealCommand, RevealConfig, RevealHandle, RevealUpdate};
pub use client::{
    ChatClient, ChatHistory, ChatMessage, ChatStreamPayload, ClientConfig, Conversation,
    ConversationList, NewConversation, Role,
};
pub use error::{Error, Result};
pub use reveal::{AppendResult, RevealBuffer, RevealState, RevealUnit, TickResult};
pub use session::{ChatSession, ChatSettings, Mode, SubmitOutcome};
pub use transport::{event_fragments, text_fragments, FragmentStream, Utf8Decoder};
