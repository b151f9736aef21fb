//! The provider abstraction.

use async_trait::async_trait;

use super::{ContentBlock, LlmMessage};
use crate::Result;
use crate::tools::ToolDefinition;

/// Everything a provider needs for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<LlmMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// A language-model backend.
///
/// Implementations translate the provider-neutral request into their own
/// wire format and map the answer back to content blocks. Only text and
/// tool-use blocks are ever returned.
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    /// Short name recorded with stored replies, e.g. `claude`.
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<ContentBlock>>;
}
