//! Message types for reveal actor communication.
//!
//! These enums define the protocol between producers (the network read
//! loop, the UI) and the reveal thread.

/// Commands sent to the reveal thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealCommand {
    /// Append a fragment to the stream buffer.
    Append(String),

    /// Clear the buffer and cancel the timer.
    Reset,

    /// Reveal everything received so far and cancel the timer.
    ///
    /// Ignored when nothing is pending.
    Finish,

    /// Shutdown the reveal thread.
    Shutdown,
}

/// Updates published by the reveal thread.
///
/// These are consumed by whatever presents the visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealUpdate {
    /// The visible text changed.
    ///
    /// Sent after every tick, after a reset (empty text), and after a
    /// finish that had something left to reveal.
    Visible(String),

    /// The cursor reached the end of the buffer and the timer stopped.
    CaughtUp,
}

impl RevealUpdate {
    /// The visible text carried by this update, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Visible(text) => Some(text),
            Self::CaughtUp => None,
        }
    }
}
