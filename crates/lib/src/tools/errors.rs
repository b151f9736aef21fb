//! Error types for tool execution.

use thiserror::Error;

/// Errors produced while validating or dispatching a tool call.
///
/// Messages are shown to the model and, through tool badges, to the user.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool is not registered.
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// Name the model asked for
        name: String,
    },

    /// Tool input failed validation.
    #[error("{message}")]
    InvalidInput {
        /// Human-readable explanation
        message: String,
    },
}

impl ToolError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ToolError::InvalidInput {
            message: message.into(),
        }
    }

    /// Check if this error is a validation failure.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, ToolError::InvalidInput { .. })
    }
}

impl From<ToolError> for crate::Error {
    fn from(err: ToolError) -> Self {
        crate::Error::Tool(err)
    }
}
