//! Reveal Buffer: the stream buffer, visible cursor, and timer state.
//!
//! The buffer holds everything received so far. The cursor trails it and
//! moves forward exactly one [`RevealUnit`] per tick. Whoever owns the
//! real timer (see [`crate::actor::RevealActor`]) calls [`RevealBuffer::tick`]
//! and arms or disarms the timer according to what [`RevealBuffer::append`]
//! and [`RevealBuffer::tick`] return.
//!
//! # Usage
//!
//! ```
//! use smoothstream::reveal::{AppendResult, RevealBuffer, TickResult};
//!
//! let mut reveal = RevealBuffer::new();
//! assert_eq!(reveal.append("Hi"), AppendResult::Started);
//! assert_eq!(reveal.tick(), TickResult::Advanced { cursor: 1 });
//! assert_eq!(reveal.tick(), TickResult::CaughtUp { cursor: 2 });
//! assert_eq!(reveal.visible(), "Hi");
//! ```

use unicode_segmentation::UnicodeSegmentation;

/// How far the cursor moves on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealUnit {
    /// One Unicode scalar value.
    #[default]
    Char,
    /// One extended grapheme cluster.
    ///
    /// A cluster still being completed by a later fragment can be shown
    /// in two steps.
    Grapheme,
}

impl RevealUnit {
    /// Byte length of the first unit of `text`, or `None` if it is empty.
    fn first_len(self, text: &str) -> Option<usize> {
        match self {
            Self::Char => text.chars().next().map(char::len_utf8),
            Self::Grapheme => text.graphemes(true).next().map(str::len),
        }
    }

    /// Number of units in `text`.
    fn count(self, text: &str) -> usize {
        match self {
            Self::Char => text.chars().count(),
            Self::Grapheme => text.graphemes(true).count(),
        }
    }
}

/// Whether the reveal timer should be running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealState {
    /// No timer; the cursor is at the end of the buffer.
    #[default]
    Idle,
    /// Timer active; the cursor is behind the end of the buffer.
    Revealing,
}

/// Result of an append operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendResult {
    /// The buffer grew while idle; the caller must start the timer.
    Started,
    /// The buffer grew while a timer was already running.
    Queued,
    /// Nothing was appended (empty fragment).
    Empty,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    /// The cursor advanced and there is more to reveal.
    Advanced {
        /// Cursor byte offset after the tick.
        cursor: usize,
    },
    /// The cursor advanced and reached the end; the caller must stop the timer.
    CaughtUp {
        /// Cursor byte offset after the tick (equal to the buffer length).
        cursor: usize,
    },
    /// Nothing to reveal. A stale tick after reset lands here.
    Idle,
}

/// Append-only text buffer with a trailing visible cursor.
///
/// The cursor is a byte offset that always sits on a unit boundary, so
/// [`RevealBuffer::visible`] never splits a UTF-8 sequence.
#[derive(Debug, Clone, Default)]
pub struct RevealBuffer {
    /// Everything received for the current stream.
    buffer: String,
    /// Byte offset of the revealed prefix.
    cursor: usize,
    /// Reveal step.
    unit: RevealUnit,
    /// Mirrors whether the owner's timer should exist.
    state: RevealState,
}

impl RevealBuffer {
    /// Create an empty buffer that reveals one `char` per tick.
    pub fn new() -> Self {
        Self::with_unit(RevealUnit::Char)
    }

    /// Create an empty buffer with the given reveal unit.
    pub const fn with_unit(unit: RevealUnit) -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            unit,
            state: RevealState::Idle,
        }
    }

    /// Append a fragment to the stream buffer.
    ///
    /// Returns [`AppendResult::Started`] exactly when the buffer moves from
    /// idle to revealing; the timer owner arms its timer on that result only.
    pub fn append(&mut self, fragment: &str) -> AppendResult {
        if fragment.is_empty() {
            return AppendResult::Empty;
        }

        self.buffer.push_str(fragment);

        match self.state {
            RevealState::Revealing => AppendResult::Queued,
            RevealState::Idle => {
                self.state = RevealState::Revealing;
                AppendResult::Started
            }
        }
    }

    /// Advance the cursor by one unit.
    pub fn tick(&mut self) -> TickResult {
        let Some(step) = self.unit.first_len(&self.buffer[self.cursor..]) else {
            self.state = RevealState::Idle;
            return TickResult::Idle;
        };

        self.cursor += step;

        if self.cursor == self.buffer.len() {
            self.state = RevealState::Idle;
            TickResult::CaughtUp { cursor: self.cursor }
        } else {
            TickResult::Advanced { cursor: self.cursor }
        }
    }

    /// Reveal the whole buffer at once and go idle.
    pub fn finish(&mut self) {
        self.cursor = self.buffer.len();
        self.state = RevealState::Idle;
    }

    /// Clear the buffer, rewind the cursor, and go idle.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.state = RevealState::Idle;
    }

    /// The revealed prefix of the buffer.
    pub fn visible(&self) -> &str {
        &self.buffer[..self.cursor]
    }

    /// Everything received so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor byte offset.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Units still waiting to be revealed.
    pub fn pending(&self) -> usize {
        self.unit.count(&self.buffer[self.cursor..])
    }

    /// Current timer state.
    pub const fn state(&self) -> RevealState {
        self.state
    }

    /// Check if the timer should be running.
    pub const fn is_revealing(&self) -> bool {
        matches!(self.state, RevealState::Revealing)
    }

    /// The configured reveal unit.
    pub const fn unit(&self) -> RevealUnit {
        self.unit
    }
}
