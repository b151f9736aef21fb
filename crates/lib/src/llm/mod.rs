//! Language-model layer: message types, providers and the tool-using assistant.
//!
//! ## Architecture
//!
//! Providers implement [`LlmProvider`], a single completion call over a
//! provider-neutral message format modelled on content blocks (text,
//! tool use, tool result). [`Assistant`] owns an ordered list of providers
//! (primary first, optional fallback second) and drives the tool loop:
//! whenever a completion asks for tools, they are run through a
//! [`ToolExecutor`] and their results are fed back for another completion.

mod claude;
mod errors;
mod openai;
mod provider;
mod scripted;

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::tools::{self, ToolExecution, ToolExecutor};

pub use claude::ClaudeProvider;
pub use errors::LlmError;
pub use openai::OpenAiProvider;
pub use provider::{CompletionRequest, LlmProvider};
pub use scripted::ScriptedProvider;

/// Default cap on tool rounds per user message.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

/// Speaker of a message sent to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

impl LlmRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

/// One piece of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn is_tool_use(&self) -> bool {
        matches!(self, ContentBlock::ToolUse { .. })
    }

    /// Concatenate the text of every text block.
    pub fn concat_text(blocks: &[ContentBlock]) -> String {
        blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Message body: either a bare string or a list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A conversation turn in provider-neutral form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: MessageContent,
}

impl LlmMessage {
    pub fn text(role: LlmRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn blocks(role: LlmRole, blocks: Vec<ContentBlock>) -> Self {
        Self {
            role,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// All text in this message, ignoring tool blocks.
    pub fn plain_text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => ContentBlock::concat_text(blocks),
        }
    }
}

/// Which provider implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Claude,
    OpenAi,
    /// Offline provider that echoes the user; for local runs without API keys
    Scripted,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Scripted => "scripted",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "openai" => Ok(ProviderKind::OpenAi),
            "scripted" => Ok(ProviderKind::Scripted),
            _ => Err(LlmError::UnknownProvider {
                name: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider selection and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub primary: ProviderKind,
    pub fallback_enabled: bool,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub max_tokens: u32,
    pub claude_model: String,
    pub openai_model: String,
    pub max_tool_rounds: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            primary: ProviderKind::Claude,
            fallback_enabled: true,
            anthropic_api_key: None,
            openai_api_key: None,
            max_tokens: 1024,
            claude_model: claude::DEFAULT_MODEL.to_string(),
            openai_model: openai::DEFAULT_MODEL.to_string(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("primary", &self.primary)
            .field("fallback_enabled", &self.fallback_enabled)
            .field("anthropic_api_key", &self.anthropic_api_key.as_ref().map(|_| "<set>"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<set>"))
            .field("max_tokens", &self.max_tokens)
            .field("claude_model", &self.claude_model)
            .field("openai_model", &self.openai_model)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish()
    }
}

fn usable_key(key: &Option<String>) -> Option<&str> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty() && !k.starts_with("your_"))
}

/// Final answer of one assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    /// Concatenated text of the final completion
    pub content: String,
    /// Blocks of the final completion, without unanswered tool calls
    pub content_blocks: Vec<ContentBlock>,
    /// Every tool run during the turn, in order
    pub tool_executions: Vec<ToolExecution>,
    /// Name of the provider that produced the final completion
    pub provider: String,
}

/// System prompt for a chat turn.
pub fn system_prompt(intentions_context: Option<&str>, working_day: NaiveDate) -> String {
    let mut prompt = format!(
        "You are a helpful assistant for an intentions tracking application.\n\n\
         Today's date is {} ({}).\n",
        working_day,
        working_day.format("%A")
    );
    if let Some(context) = intentions_context {
        prompt.push_str("\nThe user's current intentions are:\n");
        prompt.push_str(context);
        prompt.push('\n');
    }
    prompt.push_str(
        "\nHelp them prioritize tasks, break down complex intentions, suggest time management \
         strategies, and identify dependencies between tasks. When the user asks to add, change, \
         reorder or review intentions, use the available tools and refer to intentions by the ID \
         shown in parentheses. Be concise and actionable.",
    );
    prompt
}

/// Tool-using chat assistant with provider fallback.
#[derive(Debug, Clone)]
pub struct Assistant {
    providers: Vec<Arc<dyn LlmProvider>>,
    max_tool_rounds: usize,
}

impl Assistant {
    /// An assistant with a single provider.
    pub fn new(primary: Arc<dyn LlmProvider>) -> Self {
        Self {
            providers: vec![primary],
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// An assistant with no providers; every request fails with [`LlmError::NotConfigured`].
    pub fn unconfigured() -> Self {
        Self {
            providers: Vec::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Build providers from configuration.
    ///
    /// Providers without an API key are skipped, so a missing primary key
    /// with fallback enabled leaves only the fallback.
    pub fn from_config(config: &LlmConfig) -> Self {
        let claude = || -> Option<Arc<dyn LlmProvider>> {
            usable_key(&config.anthropic_api_key).map(|key| {
                Arc::new(ClaudeProvider::new(key, &config.claude_model, config.max_tokens))
                    as Arc<dyn LlmProvider>
            })
        };
        let openai = || -> Option<Arc<dyn LlmProvider>> {
            usable_key(&config.openai_api_key).map(|key| {
                Arc::new(OpenAiProvider::new(key, &config.openai_model, config.max_tokens))
                    as Arc<dyn LlmProvider>
            })
        };

        let (primary, fallback) = match config.primary {
            ProviderKind::Claude => (claude(), openai()),
            ProviderKind::OpenAi => (openai(), claude()),
            ProviderKind::Scripted => (
                Some(Arc::new(ScriptedProvider::echo()) as Arc<dyn LlmProvider>),
                None,
            ),
        };

        let mut providers: Vec<Arc<dyn LlmProvider>> = primary.into_iter().collect();
        if config.fallback_enabled {
            providers.extend(fallback);
        }

        if providers.is_empty() {
            tracing::warn!("No LLM provider configured; chat requests will fail");
        } else {
            tracing::info!(
                providers = ?providers.iter().map(|p| p.name().to_string()).collect::<Vec<_>>(),
                "Configured LLM providers"
            );
        }

        Self {
            providers,
            max_tool_rounds: config.max_tool_rounds,
        }
    }

    /// Add a fallback provider tried when the current one fails.
    pub fn with_fallback(mut self, fallback: Arc<dyn LlmProvider>) -> Self {
        self.providers.push(fallback);
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Names of the configured providers, primary first.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Ask providers in order starting at `start`, returning the blocks and
    /// the index of the provider that answered.
    async fn complete_from(
        &self,
        start: usize,
        request: &CompletionRequest,
    ) -> Result<(Vec<ContentBlock>, usize)> {
        let mut last_error = None;
        let mut attempts = 0;
        for (idx, provider) in self.providers.iter().enumerate().skip(start) {
            attempts += 1;
            match provider.complete(request).await {
                Ok(blocks) => return Ok((blocks, idx)),
                Err(e) => {
                    tracing::error!(provider = provider.name(), "LLM provider failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(_) if attempts > 1 => Err(LlmError::AllProvidersFailed.into()),
            Some(e) => Err(e),
            None => Err(LlmError::NotConfigured.into()),
        }
    }

    /// Produce a reply to `messages`, running any tools the model requests.
    ///
    /// Once a provider fails the fallback serves the rest of the turn, so
    /// tools that already ran are never repeated.
    pub async fn respond(
        &self,
        messages: Vec<LlmMessage>,
        intentions_context: Option<&str>,
        working_day: NaiveDate,
        executor: &ToolExecutor,
    ) -> Result<AssistantReply> {
        if self.providers.is_empty() {
            return Err(LlmError::NotConfigured.into());
        }

        let mut request = CompletionRequest {
            system: system_prompt(intentions_context, working_day),
            messages,
            tools: tools::definitions(),
        };

        let mut active = 0;
        let mut rounds = 0;
        let mut executions = Vec::new();
        loop {
            let (blocks, idx) = self.complete_from(active, &request).await?;
            active = idx;

            let calls: Vec<(String, String, Value)> = blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse { id, name, input } => {
                        Some((id.clone(), name.clone(), input.clone()))
                    }
                    _ => None,
                })
                .collect();

            if calls.is_empty() || rounds >= self.max_tool_rounds {
                if !calls.is_empty() {
                    tracing::warn!(rounds, "Tool round limit reached; dropping pending tool calls");
                }
                let content_blocks: Vec<ContentBlock> =
                    blocks.into_iter().filter(|b| !b.is_tool_use()).collect();
                return Ok(AssistantReply {
                    content: ContentBlock::concat_text(&content_blocks),
                    content_blocks,
                    tool_executions: executions,
                    provider: self.providers[active].name().to_string(),
                });
            }

            rounds += 1;
            let mut results = Vec::with_capacity(calls.len());
            for (id, name, input) in calls {
                let execution = executor.execute(&name, &input).await;
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id,
                    content: execution.to_model_content(),
                    is_error: !execution.success,
                });
                executions.push(execution);
            }

            request.messages.push(LlmMessage::blocks(LlmRole::Assistant, blocks));
            request.messages.push(LlmMessage::blocks(LlmRole::User, results));
        }
    }
}
