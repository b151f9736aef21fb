//! Chat command - the chat sidebar in a terminal.
//!
//! Drives [`ChatWidget`] over HTTP. Typed lines become key events for the
//! widget; a line ending in `\` continues the message (Shift+Enter). Slash
//! commands map to the sidebar controls.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};

use intentions::chat::Role;
use intentions::widget::render::{EMPTY_STATE_TEXT, tool_label};
use intentions::widget::{
    ChatWidget, Control, Focus, Host, HttpChatBackend, Key, KeyEvent, TranscriptEntry,
    WidgetConfig, WidgetEvent,
};

use crate::cli::ChatArgs;
use crate::commands::list::connect;
use crate::output::{OutputFormat, print_intentions};

const STATE_FILE: &str = "chat-state.json";

const HELP: &str = "\
Type a message and press Enter to send. End a line with \\ to continue on the next line.
Commands:
  /open, /close, /toggle   show or hide the chat (press c on an empty line to toggle)
  /clear                   delete the chat history
  /list                    show today's intentions
  /badges on|off           show or hide tool confirmations
  /help                    this text
  /quit                    exit";

/// [`Host`] backed by the terminal and a JSON file of flags.
struct TerminalHost {
    state_file: PathBuf,
    flags: HashMap<String, bool>,
    reload_at: Option<Instant>,
}

impl TerminalHost {
    fn load(state_dir: &Path) -> Self {
        let state_file = state_dir.join(STATE_FILE);
        let flags = std::fs::read_to_string(&state_file)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            state_file,
            flags,
            reload_at: None,
        }
    }

    fn save(&self) -> std::io::Result<()> {
        if let Some(parent) = self.state_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.flags)?;
        std::fs::write(&self.state_file, raw)
    }

    fn take_reload(&mut self) -> Option<Instant> {
        self.reload_at.take()
    }
}

impl Host for TerminalHost {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn load_flag(&self, key: &str) -> Option<bool> {
        self.flags.get(key).copied()
    }

    fn store_flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
        if let Err(e) = self.save() {
            tracing::warn!("Failed to save {}: {e}", self.state_file.display());
        }
    }

    fn focus_input(&mut self) {
        tracing::trace!("Chat input focused");
    }

    fn schedule_reload(&mut self, delay: Duration) {
        self.reload_at = Some(Instant::now() + delay);
    }
}

fn default_state_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_STATE_HOME") {
        return PathBuf::from(dir).join("intentions");
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".local/state/intentions"),
        None => PathBuf::from("."),
    }
}

fn print_entry(entry: &TranscriptEntry, show_badges: bool) {
    let message = match entry {
        TranscriptEntry::EmptyState => {
            println!("  {EMPTY_STATE_TEXT}");
            return;
        }
        TranscriptEntry::Message(message) => message,
    };

    let prefix = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
        Role::System => "!",
    };
    println!("{prefix}> {}", message.content);

    if show_badges && message.role == Role::Assistant {
        for execution in &message.tool_executions {
            let (icon, fallback) = if execution.success {
                ("✓", "Action completed")
            } else {
                ("✗", "Action failed")
            };
            let text = execution.message().filter(|m| !m.is_empty()).unwrap_or(fallback);
            println!("    {icon} {}: {text}", tool_label(&execution.tool_name));
        }
    }
}

/// Print what changed in the transcript since `before`.
fn print_transcript_changes(before: &[TranscriptEntry], after: &[TranscriptEntry], badges: bool) {
    let fresh = if after.starts_with(before) {
        &after[before.len()..]
    } else {
        after
    };
    for entry in fresh {
        print_entry(entry, badges);
    }
}

type TerminalWidget = ChatWidget<HttpChatBackend, TerminalHost>;

/// Feed one typed line to the widget as key presses.
async fn type_line(widget: &mut TerminalWidget, line: &str) {
    let (text, continues) = match line.strip_suffix('\\') {
        Some(text) => (text, true),
        None => (line, false),
    };
    for c in text.chars() {
        widget
            .dispatch(WidgetEvent::Key(KeyEvent::new(Key::Char(c), Focus::ChatInput)))
            .await;
    }
    let enter = KeyEvent::new(Key::Enter, Focus::ChatInput);
    let enter = if continues { enter.with_shift() } else { enter };
    widget.dispatch(WidgetEvent::Key(enter)).await;
}

async fn show_intentions(widget: &TerminalWidget) {
    match widget.backend().intentions_today().await {
        Ok(intentions) => {
            if let Err(e) = print_intentions(&intentions, OutputFormat::Human) {
                eprintln!("Failed to print intentions: {e}");
            }
        }
        Err(e) => eprintln!("Failed to load intentions: {e}"),
    }
}

/// Run the chat command
pub async fn run(args: &ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = connect(&args.client).await?;
    let state_dir = args.state_dir.clone().unwrap_or_else(default_state_dir);
    let host = TerminalHost::load(&state_dir);

    let config = WidgetConfig {
        include_intentions: !args.no_context,
        ..WidgetConfig::default()
    };
    let mut widget = ChatWidget::new(backend, host, config);
    widget.load_history().await;

    println!("Logged in as {}. Type /help for commands.", args.client.user);
    if widget.state().open {
        print_transcript_changes(&[], &widget.state().transcript, widget.state().show_tool_confirmations);
    } else {
        println!("Chat is closed. Type /open or press c then Enter to open it.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let was_open = widget.state().open;
        let before = widget.state().transcript.clone();

        match line.trim() {
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/open" => widget.open(),
            "/close" => widget.dispatch(WidgetEvent::Click(Control::Close)).await,
            "/toggle" => widget.dispatch(WidgetEvent::Click(Control::Toggle)).await,
            "/clear" => widget.dispatch(WidgetEvent::Click(Control::Clear)).await,
            "/list" => show_intentions(&widget).await,
            "/badges on" | "/badges off" => {
                let show = line.trim().ends_with("on");
                match widget.backend().set_tool_confirmations(show).await {
                    Ok(()) => widget.load_history().await,
                    Err(e) => eprintln!("Failed to change setting: {e}"),
                }
            }
            "c" if !widget.state().open => {
                widget
                    .dispatch(WidgetEvent::Key(KeyEvent::new(Key::Char('c'), Focus::Page)))
                    .await
            }
            "" => {}
            _ if !widget.state().open => {
                println!("Chat is closed. Type /open to start chatting.");
            }
            _ => type_line(&mut widget, &line).await,
        }

        let state = widget.state();
        if state.open && !was_open {
            print_transcript_changes(&[], &state.transcript, state.show_tool_confirmations);
        } else if state.open {
            print_transcript_changes(&before, &state.transcript, state.show_tool_confirmations);
        } else if was_open {
            println!("Chat closed.");
        }

        if let Some(at) = widget.host_mut().take_reload() {
            tokio::time::sleep_until(at.into()).await;
            println!("Today's intentions:");
            show_intentions(&widget).await;
        }
    }

    Ok(())
}
