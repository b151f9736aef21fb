//! OpenAI chat-completions client.
//!
//! Content blocks are mapped onto the chat-completions shape: tool-use
//! blocks become `tool_calls` on the assistant message and tool results
//! become `role: "tool"` messages.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{
    CompletionRequest, ContentBlock, LlmError, LlmMessage, LlmProvider, LlmRole, MessageContent,
};
use crate::Result;
use crate::tools::ToolDefinition;

pub(super) const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const NAME: &str = "openai";

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    id: String,
    function: FunctionCall,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// OpenAI models via chat completions with function tools.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn to_openai_messages(system: &str, messages: &[LlmMessage]) -> Vec<Value> {
    let mut out = vec![json!({"role": "system", "content": system})];

    for message in messages {
        let blocks = match &message.content {
            MessageContent::Text(text) => {
                out.push(json!({"role": message.role.as_str(), "content": text}));
                continue;
            }
            MessageContent::Blocks(blocks) => blocks,
        };

        let text = ContentBlock::concat_text(blocks);
        match message.role {
            LlmRole::Assistant => {
                let tool_calls: Vec<Value> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolUse { id, name, input } => Some(json!({
                            "id": id,
                            "type": "function",
                            "function": {"name": name, "arguments": input.to_string()},
                        })),
                        _ => None,
                    })
                    .collect();

                let mut entry = json!({"role": "assistant", "content": text});
                if !tool_calls.is_empty() {
                    entry["tool_calls"] = Value::Array(tool_calls);
                }
                out.push(entry);
            }
            LlmRole::User => {
                for block in blocks {
                    if let ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        ..
                    } = block
                    {
                        out.push(json!({
                            "role": "tool",
                            "tool_call_id": tool_use_id,
                            "content": content,
                        }));
                    }
                }
                if !text.is_empty() {
                    out.push(json!({"role": "user", "content": text}));
                }
            }
        }
    }
    out
}

fn to_openai_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema,
                },
            })
        })
        .collect()
}

fn from_openai_message(message: ResponseMessage) -> Result<Vec<ContentBlock>> {
    let mut blocks = Vec::new();
    if let Some(text) = message.content.filter(|t| !t.is_empty()) {
        blocks.push(ContentBlock::text(text));
    }
    for call in message.tool_calls {
        let input: Value = if call.function.arguments.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                LlmError::InvalidResponse {
                    provider: NAME.to_string(),
                    reason: format!("bad arguments for {}: {e}", call.function.name),
                }
            })?
        };
        blocks.push(ContentBlock::tool_use(call.id, call.function.name, input));
    }
    Ok(blocks)
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<ContentBlock>> {
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": to_openai_messages(&request.system, &request.messages),
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(to_openai_tools(&request.tools));
        }

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse {
                provider: NAME.to_string(),
                reason: e.to_string(),
            })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: NAME.to_string(),
                reason: "response contained no choices".to_string(),
            })?;

        from_openai_message(choice.message)
    }
}
