//! Chat sidebar: message types, the JSON wire contract and the server-side service.
//!
//! The same wire types are used by the HTTP handlers that produce them and by
//! the [`crate::widget`] client that consumes them, so both sides of the
//! contract stay in lockstep.

mod context;
mod errors;
mod service;

use serde::{Deserialize, Serialize};

use crate::llm::ContentBlock;
use crate::store::ChatRecord;
pub use crate::tools::ToolExecution;

pub use context::{build_intentions_context, prepare_messages_for_llm};
pub use errors::ChatError;
pub use service::{ChatConfig, ChatService};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Local notices and errors; never sent to a language model
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted form of an assistant turn that used tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StructuredDocument {
    #[serde(rename = "type", default = "assistant_type")]
    kind: String,
    content_blocks: Vec<ContentBlock>,
    #[serde(default)]
    tool_executions: Vec<ToolExecution>,
}

fn assistant_type() -> String {
    "assistant".to_string()
}

/// Decoded content of a stored chat row.
///
/// Rows are plain text unless they are an assistant turn with tool
/// executions, which is stored as a JSON document. Anything that fails to
/// decode as that document, including unrelated JSON, is plain text.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredContent {
    Plain(String),
    Structured {
        content_blocks: Vec<ContentBlock>,
        tool_executions: Vec<ToolExecution>,
    },
}

impl StoredContent {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<StructuredDocument>(raw) {
            Ok(doc) => StoredContent::Structured {
                content_blocks: doc.content_blocks,
                tool_executions: doc.tool_executions,
            },
            Err(_) => StoredContent::Plain(raw.to_string()),
        }
    }

    /// Serialize for storage.
    pub fn to_stored(&self) -> crate::Result<String> {
        match self {
            StoredContent::Plain(text) => Ok(text.clone()),
            StoredContent::Structured {
                content_blocks,
                tool_executions,
            } => Ok(serde_json::to_string(&StructuredDocument {
                kind: assistant_type(),
                content_blocks: content_blocks.clone(),
                tool_executions: tool_executions.clone(),
            })?),
        }
    }

    /// Text shown to the user: the row itself, or the concatenated text blocks.
    pub fn display_text(&self) -> String {
        match self {
            StoredContent::Plain(text) => text.clone(),
            StoredContent::Structured { content_blocks, .. } => {
                ContentBlock::concat_text(content_blocks)
            }
        }
    }

    pub fn tool_executions(&self) -> Option<&[ToolExecution]> {
        match self {
            StoredContent::Plain(_) => None,
            StoredContent::Structured {
                tool_executions, ..
            } => Some(tool_executions),
        }
    }
}

/// One message as exchanged with the chat endpoints.
///
/// Only `role` and `content` are required when decoding, so minimal
/// payloads from older servers still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_executions: Option<Vec<ToolExecution>>,
    /// Sanitized display block, filled in by servers that render for the browser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl ChatMessage {
    /// A message with just a role and text.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
            created_datetime: None,
            llm_provider: None,
            tool_executions: None,
            html: None,
        }
    }

    /// Tool executions attached to this message, empty if none.
    pub fn executions(&self) -> &[ToolExecution] {
        self.tool_executions.as_deref().unwrap_or_default()
    }
}

impl From<&ChatRecord> for ChatMessage {
    fn from(record: &ChatRecord) -> Self {
        let content = StoredContent::parse(&record.content);
        ChatMessage {
            id: Some(record.id),
            role: record.role,
            content: content.display_text(),
            created_datetime: Some(record.created_rfc3339()),
            llm_provider: record.llm_provider.clone(),
            tool_executions: content.tool_executions().map(<[_]>::to_vec),
            html: None,
        }
    }
}

/// `GET /chat/history` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_true")]
    pub show_tool_confirmations: bool,
}

/// `POST /chat/send` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_true")]
    pub include_intentions: bool,
}

impl SendRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            include_intentions: true,
        }
    }
}

/// `POST /chat/send` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<ChatMessage>,
    pub assistant_message: ChatMessage,
    #[serde(default = "default_true")]
    pub show_tool_confirmations: bool,
}

/// `POST /chat/clear` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearResponse {
    pub deleted_count: u64,
}

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

fn default_true() -> bool {
    true
}
