//! Chat sidebar client.
//!
//! [`ChatWidget`] is the client half of the chat contract. It keeps all UI
//! state in one owned [`WidgetState`], reaches the server through a
//! [`ChatBackend`] and its surroundings through a [`Host`]. Every input goes
//! through [`ChatWidget::dispatch`].
//!
//! Network failures never escape: they are turned into system messages in
//! the transcript and the widget stays usable.

mod errors;
mod events;
mod host;
mod http;
pub mod render;

use std::time::Duration;

use crate::chat::{ChatMessage, Role, SendRequest, SendResponse, ToolExecution};
use crate::{Error, Result};

pub use errors::ClientError;
pub use events::{Control, Focus, Key, KeyEvent, WidgetEvent};
pub use host::{ChatBackend, Host, MemoryHost};
pub use http::{CSRF_COOKIE, CSRF_HEADER, HttpChatBackend};

/// Storage key of the sidebar visibility flag.
pub const SIDEBAR_STORAGE_KEY: &str = "chat-sidebar-open";
/// Delay between a successful mutating tool and the view reload.
pub const DEFAULT_RELOAD_DELAY: Duration = Duration::from_millis(1500);

pub const CLEAR_CONFIRMATION: &str =
    "Are you sure you want to clear all chat history? This cannot be undone.";
const HISTORY_FAILED: &str = "Failed to load chat history.";
const SEND_FAILED: &str = "Sorry, something went wrong sending your message. Please try again.";
const CLEAR_FAILED: &str = "Failed to clear chat history.";

/// Widget settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    /// Tools whose success triggers a reload
    pub mutating_tools: Vec<String>,
    pub reload_delay: Duration,
    pub storage_key: String,
    /// Sent with every message
    pub include_intentions: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            mutating_tools: crate::tools::mutating_tool_names(),
            reload_delay: DEFAULT_RELOAD_DELAY,
            storage_key: SIDEBAR_STORAGE_KEY.to_string(),
            include_intentions: true,
        }
    }
}

/// A rendered transcript message.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub role: Role,
    pub content: String,
    pub tool_executions: Vec<ToolExecution>,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    EmptyState,
    Message(RenderedMessage),
}

impl TranscriptEntry {
    pub fn html(&self) -> String {
        match self {
            TranscriptEntry::EmptyState => render::render_empty_state(),
            TranscriptEntry::Message(message) => message.html.clone(),
        }
    }
}

/// All mutable widget state.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    pub open: bool,
    /// A send is in flight; input is disabled
    pub loading: bool,
    pub show_tool_confirmations: bool,
    pub input: String,
    pub focus: Focus,
    pub transcript: Vec<TranscriptEntry>,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            open: false,
            loading: false,
            show_tool_confirmations: true,
            input: String::new(),
            focus: Focus::Page,
            transcript: Vec::new(),
        }
    }
}

impl WidgetState {
    pub fn messages(&self) -> impl Iterator<Item = &RenderedMessage> {
        self.transcript.iter().filter_map(|entry| match entry {
            TranscriptEntry::Message(message) => Some(message),
            TranscriptEntry::EmptyState => None,
        })
    }

    pub fn shows_empty_state(&self) -> bool {
        self.transcript.contains(&TranscriptEntry::EmptyState)
    }
}

/// User-facing text for a failed request.
fn failure_text(err: &Error, fallback: &str) -> String {
    match err {
        Error::Client(client) => match client.server_message() {
            Some(message) => format!("Error: {message}"),
            None => fallback.to_string(),
        },
        _ => fallback.to_string(),
    }
}

/// The chat sidebar.
#[derive(Debug)]
pub struct ChatWidget<B, H> {
    state: WidgetState,
    config: WidgetConfig,
    backend: B,
    host: H,
}

impl<B: ChatBackend, H: Host> ChatWidget<B, H> {
    /// Create a widget, restoring sidebar visibility from host storage.
    pub fn new(backend: B, host: H, config: WidgetConfig) -> Self {
        let open = host.load_flag(&config.storage_key).unwrap_or(false);
        Self {
            state: WidgetState {
                open,
                ..WidgetState::default()
            },
            config,
            backend,
            host,
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input = text.into();
    }

    /// Class list of the sidebar element.
    pub fn sidebar_class(&self) -> &'static str {
        if self.state.open {
            "chat-sidebar open"
        } else {
            "chat-sidebar"
        }
    }

    /// Class list of the toggle button.
    pub fn toggle_button_class(&self) -> &'static str {
        if self.state.open {
            "chat-toggle active"
        } else {
            "chat-toggle"
        }
    }

    /// HTML of the whole transcript, including the loading indicator.
    pub fn transcript_html(&self) -> String {
        let mut html: String = self.state.transcript.iter().map(|e| e.html()).collect();
        if self.state.loading {
            html.push_str(&render::render_loading());
        }
        html
    }

    fn push_message(&mut self, role: Role, content: &str, executions: Vec<ToolExecution>) {
        self.state
            .transcript
            .retain(|entry| *entry != TranscriptEntry::EmptyState);
        let html = render::render_message(
            role,
            content,
            &executions,
            self.state.show_tool_confirmations,
        );
        self.state
            .transcript
            .push(TranscriptEntry::Message(RenderedMessage {
                role,
                content: content.to_string(),
                tool_executions: executions,
                html,
            }));
    }

    fn push_system(&mut self, text: &str) {
        self.push_message(Role::System, text, Vec::new());
    }

    fn render_history(&mut self, messages: Vec<ChatMessage>) {
        self.state.transcript.clear();
        if messages.is_empty() {
            self.state.transcript.push(TranscriptEntry::EmptyState);
            return;
        }
        for message in messages {
            let executions = message.tool_executions.unwrap_or_default();
            self.push_message(message.role, &message.content, executions);
        }
    }

    pub fn toggle(&mut self) {
        self.state.open = !self.state.open;
        self.host
            .store_flag(&self.config.storage_key, self.state.open);
        if self.state.open {
            self.state.focus = Focus::ChatInput;
            self.host.focus_input();
        } else if self.state.focus == Focus::ChatInput {
            self.state.focus = Focus::Page;
        }
        tracing::debug!(open = self.state.open, "Chat sidebar toggled");
    }

    pub fn open(&mut self) {
        if !self.state.open {
            self.toggle();
        }
    }

    pub fn close(&mut self) {
        if self.state.open {
            self.toggle();
        }
    }

    /// Replace the transcript with the server's history.
    pub async fn load_history(&mut self) {
        match self.backend.history().await {
            Ok(history) => {
                self.state.show_tool_confirmations = history.show_tool_confirmations;
                self.render_history(history.messages);
            }
            Err(e) => {
                tracing::warn!("Failed to load chat history: {e}");
                self.push_system(&failure_text(&e, HISTORY_FAILED));
            }
        }
    }

    /// Start a send: render the user's message and mark the widget busy.
    ///
    /// Returns `None` without touching state when the input is blank or a
    /// send is already in flight.
    pub fn begin_send(&mut self) -> Option<SendRequest> {
        if self.state.loading {
            return None;
        }
        let message = self.state.input.trim().to_string();
        if message.is_empty() {
            return None;
        }

        self.state.input.clear();
        self.push_message(Role::User, &message, Vec::new());
        self.state.loading = true;

        Some(SendRequest {
            message,
            include_intentions: self.config.include_intentions,
        })
    }

    /// Finish a send started with [`Self::begin_send`].
    pub fn finish_send(&mut self, result: Result<SendResponse>) {
        self.state.loading = false;
        match result {
            Ok(response) => {
                self.state.show_tool_confirmations = response.show_tool_confirmations;
                let assistant = response.assistant_message;
                let executions = assistant.tool_executions.unwrap_or_default();

                let reload = executions
                    .iter()
                    .any(|e| e.success && self.config.mutating_tools.contains(&e.tool_name));

                self.push_message(Role::Assistant, &assistant.content, executions);

                if reload {
                    tracing::debug!("Mutating tool succeeded; scheduling reload");
                    self.host.schedule_reload(self.config.reload_delay);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to send chat message: {e}");
                self.push_system(&failure_text(&e, SEND_FAILED));
            }
        }
        if self.state.open {
            self.state.focus = Focus::ChatInput;
        }
    }

    /// Send the current input.
    pub async fn send_message(&mut self) {
        if let Some(request) = self.begin_send() {
            let result = self.backend.send(&request).await;
            self.finish_send(result);
        }
    }

    /// Delete the transcript after the user confirms.
    pub async fn clear_history(&mut self) {
        if !self.host.confirm(CLEAR_CONFIRMATION) {
            return;
        }
        match self.backend.clear().await {
            Ok(response) => {
                let notice = format!(
                    "Chat history cleared ({} messages deleted)",
                    response.deleted_count
                );
                self.state.transcript = vec![TranscriptEntry::EmptyState];
                let html = render::render_message(Role::System, &notice, &[], false);
                self.state
                    .transcript
                    .push(TranscriptEntry::Message(RenderedMessage {
                        role: Role::System,
                        content: notice,
                        tool_executions: Vec::new(),
                        html,
                    }));
            }
            Err(e) => {
                tracing::warn!("Failed to clear chat history: {e}");
                self.push_system(&failure_text(&e, CLEAR_FAILED));
            }
        }
    }

    /// Route one input event.
    pub async fn dispatch(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::Click(Control::Toggle) => self.toggle(),
            WidgetEvent::Click(Control::Close) => self.close(),
            WidgetEvent::Click(Control::Send) => self.send_message().await,
            WidgetEvent::Click(Control::Clear) => self.clear_history().await,
            WidgetEvent::Input(text) => self.set_input(text),
            WidgetEvent::Key(key) => self.handle_key(key).await,
        }
    }

    async fn handle_key(&mut self, event: KeyEvent) {
        match (event.key, event.target) {
            (Key::Escape, _) => self.close(),
            (Key::Enter, Focus::ChatInput) if event.shift => self.state.input.push('\n'),
            (Key::Enter, Focus::ChatInput) => self.send_message().await,
            (Key::Backspace, Focus::ChatInput) => {
                self.state.input.pop();
            }
            (Key::Char(c), Focus::ChatInput) if !event.modifier => self.state.input.push(c),
            (Key::Char('c'), Focus::Page) if !event.modifier => self.toggle(),
            _ => {}
        }
    }
}
