//! Incremental reveal of streamed text.
//!
//! Network fragments arrive in bursts (whole sentences) or one token at a
//! time. Showing them as they arrive gives uneven updates, so the stream is
//! split into two parts:
//!
//! 1. **Stream buffer**: always holds the latest known text.
//! 2. **Visible cursor**: trails the buffer by a fixed step per timer tick,
//!    pausing when caught up and resuming on the next append.
//!
//! The timer itself lives with the owner of the buffer; see
//! [`crate::actor::RevealActor`].
//!
//! # State machine
//!
//! ```text
//!            append (grows buffer)
//!   ┌──────┐ ────────────────────▶ ┌───────────┐
//!   │ Idle │                       │ Revealing │ ──┐ tick (cursor < len)
//!   └──────┘ ◀──────────────────── └───────────┘ ◀─┘
//!       ▲     tick (cursor == len)       │
//!       └────────────────────────────────┘
//!                reset / teardown
//! ```

mod buffer;

pub use buffer::{AppendResult, RevealBuffer, RevealState, RevealUnit, TickResult};
