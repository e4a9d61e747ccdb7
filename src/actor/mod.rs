//! Actor Model: Message-passing pacing of streamed text.
//!
//! Each reveal actor owns one [`RevealBuffer`](crate::reveal::RevealBuffer)
//! on a dedicated thread and talks to the rest of the program over
//! crossbeam channels:
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   RevealCommand    ┌──────────────┐
//! │ Network Loop │ ─────────────────▶ │              │
//! └──────────────┘                    │ Reveal Actor │ ◀── tick (only while revealing)
//!                                     │              │
//! ┌──────────────┐   RevealUpdate     │              │
//! │   UI / View  │ ◀───────────────── │              │
//! └──────────────┘                    └──────────────┘
//! ```
//!
//! Two chat views streaming at once get two actors, each with its own timer.

mod messages;
mod reveal;

pub use messages::{RevealCommand, RevealUpdate};
pub use reveal::{RevealActor, RevealConfig, RevealHandle};
