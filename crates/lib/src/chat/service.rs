//! Server-side handling of the three chat operations.

use std::sync::Arc;

use crate::Result;
use crate::llm::{Assistant, LlmRole};
use crate::store::{Store, User};
use crate::tools::ToolExecutor;

use super::context::{build_intentions_context, prepare_messages_for_llm};
use super::{
    ChatError, ChatMessage, ClearResponse, HistoryResponse, Role, SendRequest, SendResponse,
    StoredContent,
};

/// Limits and context settings for the chat service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Maximum user messages per UTC day
    pub max_messages_per_day: usize,
    /// Number of most recent messages sent to the model
    pub history_window: usize,
    /// Previous days included in the intentions context (0 = working day only)
    pub context_days: i64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_messages_per_day: 50,
            history_window: 20,
            context_days: 0,
        }
    }
}

/// Persists chat messages and runs the assistant on behalf of a user.
#[derive(Debug, Clone)]
pub struct ChatService {
    store: Store,
    assistant: Arc<Assistant>,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(store: Store, assistant: Arc<Assistant>, config: ChatConfig) -> Self {
        Self {
            store,
            assistant,
            config,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// The user's transcript in creation order.
    pub async fn history(&self, user: &User) -> Result<HistoryResponse> {
        let records = self.store.chat_history(user.id).await?;
        Ok(HistoryResponse {
            messages: records.iter().map(ChatMessage::from).collect(),
            show_tool_confirmations: user.show_tool_confirmations,
        })
    }

    /// Store the user's message, run the assistant and store its reply.
    pub async fn send(&self, user: &User, request: SendRequest) -> Result<SendResponse> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage.into());
        }

        let since = self.store.clock().today_start_millis() as i64;
        let sent_today = self
            .store
            .count_chat_messages_since(user.id, Role::User, since)
            .await?;
        if sent_today >= self.config.max_messages_per_day {
            tracing::warn!(user_id = user.id, sent_today, "Daily chat limit reached");
            return Err(ChatError::RateLimited {
                limit: self.config.max_messages_per_day,
            }
            .into());
        }

        let user_record = self
            .store
            .add_chat_message(user.id, Role::User, message, None)
            .await?;

        let recent = self
            .store
            .recent_chat_messages(user.id, self.config.history_window)
            .await?;
        // Providers expect the conversation to open with a user turn.
        let conversation: Vec<_> = prepare_messages_for_llm(&recent)
            .into_iter()
            .skip_while(|m| m.role == LlmRole::Assistant)
            .collect();

        let working_day = self.store.clock().working_day();
        let context = if request.include_intentions {
            Some(
                build_intentions_context(
                    &self.store,
                    user.id,
                    working_day,
                    self.config.context_days,
                )
                .await?,
            )
        } else {
            None
        };

        let executor = ToolExecutor::new(self.store.clone(), user.id);
        let reply = self
            .assistant
            .respond(conversation, context.as_deref(), working_day, &executor)
            .await?;

        let stored = if reply.tool_executions.is_empty() {
            StoredContent::Plain(reply.content.clone())
        } else {
            StoredContent::Structured {
                content_blocks: reply.content_blocks.clone(),
                tool_executions: reply.tool_executions.clone(),
            }
        };
        let assistant_record = self
            .store
            .add_chat_message(
                user.id,
                Role::Assistant,
                &stored.to_stored()?,
                Some(&reply.provider),
            )
            .await?;

        tracing::info!(
            user_id = user.id,
            provider = %reply.provider,
            tools = reply.tool_executions.len(),
            "Chat reply stored"
        );

        let mut assistant_message = ChatMessage::from(&assistant_record);
        assistant_message.content = reply.content;
        assistant_message.tool_executions = Some(reply.tool_executions);

        Ok(SendResponse {
            user_message: Some(ChatMessage::from(&user_record)),
            assistant_message,
            show_tool_confirmations: user.show_tool_confirmations,
        })
    }

    /// Delete the user's whole transcript.
    pub async fn clear(&self, user: &User) -> Result<ClearResponse> {
        let deleted_count = self.store.clear_chat_history(user.id).await?;
        Ok(ClearResponse { deleted_count })
    }
}
