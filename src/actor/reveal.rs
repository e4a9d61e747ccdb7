//! Reveal Actor: Dedicated thread that owns one reveal buffer and its timer.
//!
//! Every mutation of the buffer (append, tick, reset) runs on this thread,
//! one message at a time, so the buffer needs no lock. The reveal timer is
//! a field of the running loop: it only exists while the buffer is
//! revealing, and is dropped as soon as the cursor catches up.

use super::messages::{RevealCommand, RevealUpdate};
use crate::error::{Error, Result};
use crate::reveal::{AppendResult, RevealBuffer, RevealUnit, TickResult};
use crossbeam_channel::{never, select, tick, unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Configuration for a reveal actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealConfig {
    /// Time between two reveal steps.
    pub period: Duration,
    /// How much one step reveals.
    pub unit: RevealUnit,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(30),
            unit: RevealUnit::Char,
        }
    }
}

/// Cloneable sending side of a reveal actor.
///
/// Producers on other threads or async tasks use this to feed fragments.
/// Sends never block.
#[derive(Debug, Clone)]
pub struct RevealHandle {
    command_tx: Sender<RevealCommand>,
}

impl RevealHandle {
    /// Append a fragment to the stream buffer.
    pub fn append(&self, fragment: impl Into<String>) -> Result<()> {
        self.send(RevealCommand::Append(fragment.into()))
    }

    /// Clear the stream buffer and cancel the timer.
    pub fn reset(&self) -> Result<()> {
        self.send(RevealCommand::Reset)
    }

    /// Reveal everything received so far.
    pub fn finish(&self) -> Result<()> {
        self.send(RevealCommand::Finish)
    }

    fn send(&self, command: RevealCommand) -> Result<()> {
        self.command_tx.send(command).map_err(|_| Error::ActorGone)
    }
}

/// Reveal actor that paces visible text on its own thread.
pub struct RevealActor {
    /// Handle to the reveal thread.
    handle: Option<JoinHandle<()>>,
    /// Command sender.
    commands: RevealHandle,
    /// Receiver for visible-text updates.
    update_rx: Receiver<RevealUpdate>,
}

impl RevealActor {
    /// Spawn a new reveal actor.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the reveal thread.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn(config: RevealConfig) -> Self {
        let (command_tx, command_rx) = unbounded();
        let (update_tx, update_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("smoothstream-reveal".to_string())
            .spawn(move || {
                Self::run_loop(&command_rx, &update_tx, config);
            })
            .expect("Failed to spawn reveal thread");

        Self {
            handle: Some(handle),
            commands: RevealHandle { command_tx },
            update_rx,
        }
    }

    /// Get a reference to the update receiver.
    ///
    /// Use this with `select!` or `recv_timeout` in the presentation loop:
    ///
    /// ```ignore
    /// while let Ok(update) = actor.updates().recv() {
    ///     if let RevealUpdate::Visible(text) = update {
    ///         draw(&text);
    ///     }
    /// }
    /// ```
    #[inline]
    pub const fn updates(&self) -> &Receiver<RevealUpdate> {
        &self.update_rx
    }

    /// Get a cloneable handle for producers.
    pub fn handle(&self) -> RevealHandle {
        self.commands.clone()
    }

    /// Append a fragment to the stream buffer.
    pub fn append(&self, fragment: impl Into<String>) -> Result<()> {
        self.commands.append(fragment)
    }

    /// Clear the stream buffer and cancel the timer.
    pub fn reset(&self) -> Result<()> {
        self.commands.reset()
    }

    /// Reveal everything received so far.
    pub fn finish(&self) -> Result<()> {
        self.commands.finish()
    }

    /// Signal the reveal thread to shutdown.
    pub fn shutdown(&self) {
        let _ = self.commands.send(RevealCommand::Shutdown);
    }

    /// Wait for the reveal thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main reveal loop.
    fn run_loop(
        command_rx: &Receiver<RevealCommand>,
        update_tx: &Sender<RevealUpdate>,
        config: RevealConfig,
    ) {
        let mut reveal = RevealBuffer::with_unit(config.unit);
        let mut timer: Option<Receiver<Instant>> = None;

        loop {
            // Without a timer only commands can wake us.
            let ticker = timer.clone().unwrap_or_else(never);

            select! {
                recv(command_rx) -> command => match command {
                    Ok(RevealCommand::Append(fragment)) => {
                        trace!(bytes = fragment.len(), "fragment appended");
                        if reveal.append(&fragment) == AppendResult::Started {
                            debug!(period = ?config.period, "reveal timer started");
                            timer = Some(tick(config.period));
                        }
                    }
                    Ok(RevealCommand::Reset) => {
                        reveal.reset();
                        timer = None;
                        let _ = update_tx.send(RevealUpdate::Visible(String::new()));
                    }
                    Ok(RevealCommand::Finish) => {
                        // Only a running reveal has anything left to publish.
                        if timer.take().is_some() {
                            reveal.finish();
                            let _ = update_tx.send(RevealUpdate::Visible(reveal.visible().to_string()));
                            let _ = update_tx.send(RevealUpdate::CaughtUp);
                        }
                    }
                    Ok(RevealCommand::Shutdown) | Err(_) => break,
                },
                recv(ticker) -> _ => match reveal.tick() {
                    TickResult::Advanced { .. } => {
                        let _ = update_tx.send(RevealUpdate::Visible(reveal.visible().to_string()));
                    }
                    TickResult::CaughtUp { cursor } => {
                        debug!(cursor, "reveal caught up, timer stopped");
                        timer = None;
                        let _ = update_tx.send(RevealUpdate::Visible(reveal.visible().to_string()));
                        let _ = update_tx.send(RevealUpdate::CaughtUp);
                    }
                    TickResult::Idle => timer = None,
                },
            }
        }

        debug!("reveal thread exiting");
    }
}

impl Drop for RevealActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
