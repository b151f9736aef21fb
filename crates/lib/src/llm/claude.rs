//! Anthropic Messages API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CompletionRequest, ContentBlock, LlmError, LlmMessage, LlmProvider};
use crate::Result;
use crate::tools::ToolDefinition;

pub(super) const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const NAME: &str = "claude";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [LlmMessage],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<Value>,
}

/// Claude via the Messages API with native tool use.
#[derive(Clone)]
pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl ClaudeProvider {
    pub fn new(api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host, e.g. a proxy or a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl std::fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeProvider")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Keep text and tool-use blocks; anything else the API adds is ignored.
fn parse_blocks(content: Vec<Value>) -> Vec<ContentBlock> {
    content
        .into_iter()
        .filter_map(|v| serde_json::from_value::<ContentBlock>(v).ok())
        .filter(|b| matches!(b, ContentBlock::Text { .. } | ContentBlock::ToolUse { .. }))
        .collect()
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<ContentBlock>> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: &request.system,
            messages: &request.messages,
            tools: &request.tools,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|source| LlmError::Request {
                provider: NAME.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: NAME.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: MessagesResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    provider: NAME.to_string(),
                    reason: e.to_string(),
                })?;

        let blocks = parse_blocks(parsed.content);
        if blocks.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: NAME.to_string(),
                reason: "response contained no content".to_string(),
            }
            .into());
        }
        Ok(blocks)
    }
}
