//! Smoothstream CLI - stream a chat reply into the terminal at a steady pace.
//!
//! With a prompt argument, sends it once and exits after the reply is fully
//! revealed. Without one, reads prompts from stdin line by line; `/retry`
//! resends the last prompt after a failure. Ctrl-C stops the current stream
//! and exits.

use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{Receiver, Sender};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::{execute, queue};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use smoothstream::{
    ChatClient, ChatSession, ChatSettings, ClientConfig, Conversation, Mode, NewConversation,
    RevealActor, RevealConfig, RevealUnit, RevealUpdate, Role, SubmitOutcome,
};

/// Smoothstream - paced streaming chat client.
#[derive(Parser, Debug)]
#[command(name = "smoothstream")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Prompt to send. Reads prompts from stdin when omitted.
    prompt: Option<String>,

    /// Backend base URL.
    #[arg(
        long,
        env = "SMOOTHSTREAM_API_BASE_URL",
        default_value = "http://localhost:8000"
    )]
    base_url: String,

    /// Bearer token for the chat endpoints.
    #[arg(long, env = "SMOOTHSTREAM_TOKEN")]
    token: Option<String>,

    /// Milliseconds between two reveal steps.
    #[arg(long, env = "SMOOTHSTREAM_REVEAL_MS", default_value_t = 30)]
    reveal_ms: u64,

    /// Reveal whole grapheme clusters instead of single characters.
    #[arg(long)]
    graphemes: bool,

    /// Show each reply at once when its stream ends.
    #[arg(long)]
    instant: bool,

    /// Use the event-stream chat endpoint instead of the plain-text one.
    #[arg(long)]
    chat: bool,

    /// Model name (chat endpoint).
    #[arg(long, default_value = "gpt-3.5-turbo")]
    model: String,

    /// System prompt (chat endpoint).
    #[arg(long, default_value = "")]
    system: String,

    /// Sampling temperature (chat endpoint).
    #[arg(long, default_value_t = 0.7)]
    temperature: f64,

    /// Conversation thread (chat endpoint).
    #[arg(long)]
    thread: Option<String>,

    /// Print the stored transcript of `--thread` before prompting.
    #[arg(long, requires = "thread")]
    history: bool,

    /// List stored conversations and exit.
    #[arg(long, conflicts_with = "prompt")]
    list_conversations: bool,

    /// Register `--thread` as a conversation with this title before prompting.
    #[arg(long, value_name = "TITLE", requires = "thread")]
    new_conversation: Option<String>,

    /// Delete the conversation `--thread` and exit.
    #[arg(long, requires = "thread", conflicts_with = "prompt")]
    delete_conversation: bool,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,
}

impl Args {
    fn mode(&self) -> Mode {
        if self.chat {
            Mode::Chat(ChatSettings {
                model_name: self.model.clone(),
                system_message: self.system.clone(),
                temperature: self.temperature,
                thread_id: self.thread.clone().unwrap_or_default(),
            })
        } else {
            Mode::Text
        }
    }

    /// The `--thread` value for flags that operate on one conversation.
    fn thread(&self) -> anyhow::Result<&str> {
        match self.thread.as_deref() {
            Some(thread) if !thread.is_empty() => Ok(thread),
            _ => anyhow::bail!("--thread must name a conversation"),
        }
    }

    const fn reveal_config(&self) -> RevealConfig {
        RevealConfig {
            period: Duration::from_millis(self.reveal_ms),
            unit: if self.graphemes { RevealUnit::Grapheme } else { RevealUnit::Char },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    if let Some(filter) = log_filter(args.debug, std::env::var("RUST_LOG").ok()) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    let client = ChatClient::new(ClientConfig {
        base_url: args.base_url.clone(),
        token: args.token.clone(),
        ..ClientConfig::default()
    })?;

    if args.list_conversations {
        return print_conversations(&client.list_conversations().await?);
    }
    if args.delete_conversation {
        let thread = args.thread()?;
        client.delete_conversation(thread).await?;
        println!("deleted {thread}");
        return Ok(());
    }
    if let Some(title) = &args.new_conversation {
        let created = client
            .create_conversation(&NewConversation {
                title: title.clone(),
                thread_id: args.thread()?.to_string(),
            })
            .await?;
        tracing::info!(thread_id = %created.thread_id, "conversation created");
    }

    let actor = RevealActor::spawn(args.reveal_config());
    let mut session = ChatSession::new(client, actor.handle(), args.mode());

    if args.history {
        session.load_history(args.thread()?).await?;
        print_transcript(&session)?;
    }

    // Printer thread: turns visible-text updates into terminal output.
    let (caught_up_tx, caught_up_rx) = crossbeam_channel::unbounded();
    let updates = actor.updates().clone();
    let printer = std::thread::Builder::new()
        .name("smoothstream-printer".to_string())
        .spawn(move || print_updates(&updates, &caught_up_tx))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if let Some(prompt) = args.prompt.clone() {
        run_prompt(&mut session, &actor, &caught_up_rx, Input::Prompt(&prompt), &cancel, args.instant)
            .await?;
    } else {
        let mut lines = spawn_stdin_reader()?;
        loop {
            write_prompt_marker()?;
            let line = tokio::select! {
                () = cancel.cancelled() => None,
                line = lines.recv() => line,
            };
            let Some(line) = line else { break };
            let input = if line.trim() == "/retry" { Input::Retry } else { Input::Prompt(&line) };
            run_prompt(&mut session, &actor, &caught_up_rx, input, &cancel, args.instant).await?;
            if cancel.is_cancelled() {
                break;
            }
        }
    }

    actor.join();
    let _ = printer.join();
    Ok(())
}

/// Pick the log filter; `None` means no subscriber at all.
///
/// `--debug` wins over `RUST_LOG`.
fn log_filter(debug: bool, rust_log: Option<String>) -> Option<EnvFilter> {
    if debug {
        Some(EnvFilter::new("smoothstream=debug,warn"))
    } else {
        rust_log.map(EnvFilter::new)
    }
}

/// What the user asked for on one input line.
#[derive(Debug, Clone, Copy)]
enum Input<'a> {
    Prompt(&'a str),
    Retry,
}

/// Submit one prompt and wait until its reply is fully on screen.
async fn run_prompt(
    session: &mut ChatSession,
    actor: &RevealActor,
    caught_up: &Receiver<String>,
    input: Input<'_>,
    cancel: &CancellationToken,
    instant: bool,
) -> anyhow::Result<()> {
    while caught_up.try_recv().is_ok() {}

    let submitted = match input {
        Input::Prompt(prompt) => session.submit(prompt, cancel).await,
        Input::Retry => session.retry(cancel).await,
    };
    let outcome = match submitted {
        Ok(SubmitOutcome::Empty) => return Ok(()),
        Err(smoothstream::Error::ActorGone) => anyhow::bail!("reveal actor stopped"),
        outcome => outcome,
    };

    let reply = session
        .messages()
        .last()
        .filter(|message| message.role == Role::Assistant)
        .map(|message| message.content.clone());

    if let Some(reply) = reply {
        // Anything but a clean finish skips the rest of the animation.
        if instant || !matches!(outcome, Ok(SubmitOutcome::Completed)) {
            actor.finish()?;
        }
        // The reveal may have caught up between fragments; wait for the
        // catch-up that covers the whole reply.
        let caught_up = caught_up.clone();
        tokio::task::spawn_blocking(move || loop {
            match caught_up.recv() {
                Ok(visible) if visible == reply => return Ok(()),
                Ok(_) => {}
                Err(err) => return Err(err),
            }
        })
        .await??;
        println!();
    }

    if let Some(message) = session.error() {
        print_error(message)?;
        if outcome.as_ref().is_err_and(smoothstream::Error::is_retriable) {
            print_hint("type /retry to send it again")?;
        }
    }
    Ok(())
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> io::Result<mpsc::UnboundedReceiver<String>> {
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("smoothstream-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lines() {
                let Ok(line) = line else { break };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(line_rx)
}

/// Print the growing suffix of the visible text.
fn print_updates(updates: &Receiver<RevealUpdate>, caught_up: &Sender<String>) {
    let mut stdout = io::stdout();
    let mut shown = String::new();

    while let Ok(update) = updates.recv() {
        let Some(text) = update.text() else {
            let _ = caught_up.send(shown.clone());
            continue;
        };

        // A reset shrinks the text; start over from what is visible now.
        let delta = text.strip_prefix(shown.as_str()).unwrap_or(text);

        let _ = queue!(stdout, Print(delta));
        let _ = stdout.flush();
        text.clone_into(&mut shown);
    }
}

fn print_transcript(session: &ChatSession) -> io::Result<()> {
    let mut stdout = io::stdout();
    for message in session.messages() {
        let (label, color) = match message.role {
            Role::User => ("you", Color::Cyan),
            Role::Assistant => ("assistant", Color::Green),
            Role::System => ("system", Color::DarkGrey),
        };
        queue!(
            stdout,
            SetForegroundColor(color),
            Print(format!("{label}: ")),
            ResetColor,
            Print(&message.content),
            Print("\n")
        )?;
    }
    stdout.flush()
}

fn print_conversations(conversations: &[Conversation]) -> anyhow::Result<()> {
    let mut stdout = io::stdout();
    for conversation in conversations {
        queue!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print(&conversation.thread_id),
            ResetColor,
            Print(format!("  {}  ", conversation.created_at)),
            Print(&conversation.title),
            Print("\n")
        )?;
    }
    stdout.flush()?;
    Ok(())
}

fn print_hint(message: &str) -> io::Result<()> {
    execute!(
        io::stderr(),
        SetForegroundColor(Color::DarkGrey),
        Print(message),
        ResetColor,
        Print("\n")
    )
}

fn print_error(message: &str) -> io::Result<()> {
    execute!(
        io::stderr(),
        SetForegroundColor(Color::Red),
        Print(message),
        ResetColor,
        Print("\n")
    )
}

fn write_prompt_marker() -> io::Result<()> {
    execute!(
        io::stdout(),
        SetForegroundColor(Color::DarkGrey),
        Print("> "),
        ResetColor
    )
}
