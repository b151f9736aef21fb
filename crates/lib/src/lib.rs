//!
//! Intentions: a personal daily task tracker with an AI chat assistant.
//!
//! ## Core Concepts
//!
//! * **Intentions (`store::Intention`)**: Per-day task items with flags such as
//!   `completed`, `sticky` and `froggy` (the single most important task of a day).
//! * **Store (`store::Store`)**: SQLite-backed persistence for users, intentions and chat history.
//! * **Tools (`tools::ToolExecutor`)**: Validated operations the assistant may run against the store.
//! * **Assistant (`llm::Assistant`)**: Drives a language model through a tool loop with provider fallback.
//! * **Chat (`chat::ChatService`)**: Server side of the chat sidebar: history, send with rate limiting, clear.
//! * **Widget (`widget::ChatWidget`)**: Client side of the chat sidebar as an explicit state machine.
//! * **Clock (`clock::Clock`)**: Time source, including the working day that rolls over at 04:00 UTC.

pub mod auth;
pub mod chat;
pub mod clock;
pub mod llm;
pub mod store;
pub mod tools;
pub mod widget;

pub use clock::{Clock, FixedClock, SystemClock};

/// Result type used throughout the Intentions library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Intentions library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured storage errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured authentication errors from the auth module
    #[error(transparent)]
    Auth(auth::AuthError),

    /// Structured tool errors from the tools module
    #[error(transparent)]
    Tool(tools::ToolError),

    /// Structured provider errors from the llm module
    #[error(transparent)]
    Llm(llm::LlmError),

    /// Structured chat request errors from the chat module
    #[error(transparent)]
    Chat(chat::ChatError),

    /// Structured client errors from the widget module
    #[error(transparent)]
    Client(widget::ClientError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Store(_) => "store",
            Error::Auth(_) => "auth",
            Error::Tool(_) => "tools",
            Error::Llm(_) => "llm",
            Error::Chat(_) => "chat",
            Error::Client(_) => "widget",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            Error::Client(client_err) => client_err.status() == Some(404),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Auth(_) => true,
            Error::Client(client_err) => client_err.is_unauthorized(),
            _ => false,
        }
    }

    /// Check if this error was caused by bad input rather than a system failure.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Tool(tool_err) => tool_err.is_validation_error(),
            Error::Chat(chat_err) => chat_err.is_bad_request(),
            _ => false,
        }
    }

    /// Check if this error is a rate-limit rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Chat(chat_err) if chat_err.is_rate_limited())
    }

    /// Check if this error is database-related.
    pub fn is_database_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_sql_error(),
            _ => false,
        }
    }

    /// Check if this error came from a language-model provider.
    pub fn is_llm_error(&self) -> bool {
        matches!(self, Error::Llm(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
