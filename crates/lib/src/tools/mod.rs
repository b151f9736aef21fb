//! Tools the assistant can invoke against the intentions store.
//!
//! Each tool has a JSON-schema definition advertised to the model and an
//! executor that validates the model's input before touching the store.
//! Execution never fails as a Rust error: every outcome is captured in a
//! [`ToolExecution`] record that is fed back to the model and shown to the
//! user as a badge.

mod errors;
mod executors;
mod input;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::store::Store;

pub use errors::ToolError;
pub use input::MAX_TITLE_CHARS;

/// Most intentions one batch call may create.
pub const MAX_BATCH_SIZE: usize = 20;

/// Every registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CreateIntention,
    CreateIntentionsBatch,
    UpdateIntentionStatus,
    ReorderIntentions,
    ListIntentions,
    GetIntentionDetails,
    UpdateIntention,
    DeleteIntention,
}

impl ToolName {
    pub const ALL: [ToolName; 8] = [
        ToolName::CreateIntention,
        ToolName::CreateIntentionsBatch,
        ToolName::UpdateIntentionStatus,
        ToolName::ReorderIntentions,
        ToolName::ListIntentions,
        ToolName::GetIntentionDetails,
        ToolName::UpdateIntention,
        ToolName::DeleteIntention,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CreateIntention => "create_intention",
            ToolName::CreateIntentionsBatch => "create_intentions_batch",
            ToolName::UpdateIntentionStatus => "update_intention_status",
            ToolName::ReorderIntentions => "reorder_intentions",
            ToolName::ListIntentions => "list_intentions",
            ToolName::GetIntentionDetails => "get_intention_details",
            ToolName::UpdateIntention => "update_intention",
            ToolName::DeleteIntention => "delete_intention",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Whether a successful call changes stored intentions.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            ToolName::ListIntentions | ToolName::GetIntentionDetails
        )
    }

    fn description(&self) -> &'static str {
        match self {
            ToolName::CreateIntention => {
                "Create a new intention for a specific date. Use when user asks to add, create, or track a new task."
            }
            ToolName::CreateIntentionsBatch => {
                "Create multiple intentions at once (batch operation). Use when user asks to break down a complex task into subtasks, or wants to create several tasks simultaneously. Maximum 20 intentions per batch."
            }
            ToolName::UpdateIntentionStatus => {
                "Update the status of an intention. Use when user indicates they completed/neverminded a task, or wants to change sticky/froggy/anxiety-inducing flags. Examples: \"I finished X\", \"Mark Y as my frog\", \"Make Z sticky\", \"I'm not doing X anymore\"."
            }
            ToolName::ReorderIntentions => {
                "Reorder intentions for a specific date by priority. Use when user asks to prioritize, sort, or reorder their tasks. Provide the intention IDs in the desired order (first ID will be shown first)."
            }
            ToolName::ListIntentions => {
                "List all intentions for a specific date with optional status filtering. Use when user asks to see their tasks, view intentions, or check what they have planned. Returns full details for each intention."
            }
            ToolName::GetIntentionDetails => {
                "Get detailed information about a specific intention by ID. Use when user asks for details about a specific task or when you need to verify intention properties before updating."
            }
            ToolName::UpdateIntention => {
                "Update an intention's title and/or date. Use when user wants to modify, rename, change, or reschedule an existing task. At least one of title or date must be provided."
            }
            ToolName::DeleteIntention => {
                "Delete an intention permanently. Use when user wants to remove, delete, or get rid of a task entirely. This is permanent and cannot be undone."
            }
        }
    }

    fn input_schema(&self) -> Value {
        const OPTIONAL_DATE: &str = "Date in YYYY-MM-DD format. ONLY provide this if the user explicitly requests a specific date. Otherwise, omit this parameter to use today's date.";
        const ID: &str = "ID of the intention (shown in parentheses like \"ID: 123\")";

        match self {
            ToolName::CreateIntention => json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Title of the intention"},
                    "date": {"type": "string", "description": OPTIONAL_DATE},
                    "froggy": {
                        "type": "boolean",
                        "description": "Most important task (frog) for the day. Only one frog per day allowed.",
                        "default": false
                    },
                    "sticky": {
                        "type": "boolean",
                        "description": "Should carry forward to future days if incomplete",
                        "default": false
                    },
                    "anxiety_inducing": {
                        "type": "boolean",
                        "description": "Whether task causes anxiety/stress",
                        "default": false
                    }
                },
                "required": ["title"]
            }),
            ToolName::CreateIntentionsBatch => json!({
                "type": "object",
                "properties": {
                    "intentions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "title": {"type": "string", "description": "Title of the intention (max 500 characters)"},
                                "date": {"type": "string", "description": "Date in YYYY-MM-DD format (optional, overrides batch-level date)"},
                                "froggy": {"type": "boolean", "description": "Mark as frog/most important (optional, only one frog per day allowed)", "default": false},
                                "sticky": {"type": "boolean", "description": "Should carry forward if incomplete (optional)", "default": false},
                                "anxiety_inducing": {"type": "boolean", "description": "Causes anxiety/stress (optional)", "default": false}
                            },
                            "required": ["title"]
                        },
                        "description": "List of intentions to create (max 20). Each must have at least a title."
                    },
                    "date": {
                        "type": "string",
                        "description": "Default date for all intentions in YYYY-MM-DD format. Individual intentions can override this. ONLY provide if user explicitly requests a specific date, otherwise omit to use today's date."
                    }
                },
                "required": ["intentions"]
            }),
            ToolName::UpdateIntentionStatus => json!({
                "type": "object",
                "properties": {
                    "intention_id": {"type": "integer", "description": ID},
                    "status_field": {
                        "type": "string",
                        "description": "Which status to update",
                        "enum": ["completed", "neverminded", "sticky", "froggy", "anxiety_inducing"]
                    },
                    "value": {"type": "boolean", "description": "New value for the status (true to set, false to unset)"}
                },
                "required": ["intention_id", "status_field", "value"]
            }),
            ToolName::ReorderIntentions => json!({
                "type": "object",
                "properties": {
                    "intention_ids": {
                        "type": "array",
                        "items": {"type": "integer"},
                        "description": "List of intention IDs in the desired order (first ID = highest priority/first in list)"
                    },
                    "date": {"type": "string", "description": OPTIONAL_DATE}
                },
                "required": ["intention_ids"]
            }),
            ToolName::ListIntentions => json!({
                "type": "object",
                "properties": {
                    "date": {"type": "string", "description": OPTIONAL_DATE},
                    "status_filter": {
                        "type": "string",
                        "description": "Filter by status: \"active\" (not completed/neverminded), \"completed\", \"neverminded\", or \"all\"",
                        "enum": ["active", "completed", "neverminded", "all"]
                    }
                },
                "required": []
            }),
            ToolName::GetIntentionDetails | ToolName::DeleteIntention => json!({
                "type": "object",
                "properties": {
                    "intention_id": {"type": "integer", "description": ID}
                },
                "required": ["intention_id"]
            }),
            ToolName::UpdateIntention => json!({
                "type": "object",
                "properties": {
                    "intention_id": {"type": "integer", "description": ID},
                    "title": {"type": "string", "description": "New title for the intention (optional, max 500 characters)"},
                    "date": {"type": "string", "description": "New date in YYYY-MM-DD format (optional)"}
                },
                "required": ["intention_id"]
            }),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.as_str().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
            mutating: self.is_mutating(),
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool as advertised to a language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    #[serde(skip)]
    pub mutating: bool,
}

/// Definitions of every registered tool.
pub fn definitions() -> Vec<ToolDefinition> {
    ToolName::ALL.iter().map(ToolName::definition).collect()
}

/// Names of the tools whose success changes stored intentions.
pub fn mutating_tool_names() -> Vec<String> {
    ToolName::ALL
        .iter()
        .filter(|t| t.is_mutating())
        .map(|t| t.as_str().to_string())
        .collect()
}

/// Outcome of one tool call.
///
/// Exactly one of `result` and `error` is set, matching `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecution {
    pub tool_name: String,
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ToolExecution {
    pub fn succeeded(tool_name: impl Into<String>, result: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Human-readable outcome: the result's `message` or the error text.
    pub fn message(&self) -> Option<&str> {
        if self.success {
            self.result
                .as_ref()
                .and_then(|r| r.get("message"))
                .and_then(Value::as_str)
        } else {
            self.error.as_deref()
        }
    }

    /// The `{success, result, error}` document returned to the model.
    pub fn to_model_content(&self) -> String {
        json!({
            "success": self.success,
            "result": self.result,
            "error": self.error,
        })
        .to_string()
    }
}

/// Runs tools for one user.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    store: Store,
    user_id: i64,
}

impl ToolExecutor {
    pub fn new(store: Store, user_id: i64) -> Self {
        Self { store, user_id }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Execute a tool by name. Failures are reported in the returned record.
    pub async fn execute(&self, tool_name: &str, input: &Value) -> ToolExecution {
        let Some(tool) = ToolName::parse(tool_name) else {
            tracing::warn!(tool_name, "Model requested unknown tool");
            return ToolExecution::failed(
                tool_name,
                ToolError::UnknownTool {
                    name: tool_name.to_string(),
                }
                .to_string(),
            );
        };

        match executors::run(&self.store, self.user_id, tool, input).await {
            Ok(result) => {
                tracing::debug!(tool_name, user_id = self.user_id, "Tool succeeded");
                ToolExecution::succeeded(tool_name, result)
            }
            Err(e) => {
                tracing::error!(tool_name, user_id = self.user_id, "Tool execution failed: {e}");
                ToolExecution::failed(tool_name, e.to_string())
            }
        }
    }
}
