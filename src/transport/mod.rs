//! Network boundary: from response bodies to text fragments.
//!
//! Fragment streams are ordinary [`futures::Stream`]s, so the consumer
//! iterates them explicitly and can race each read against a cancellation
//! token (see [`crate::session::ChatSession::submit`]).

mod fragments;
mod utf8;

pub use fragments::{event_fragments, text_fragments, FragmentStream};
pub use utf8::Utf8Decoder;
