//! Persisted chat transcript rows.

use crate::Result;
use crate::chat::Role;
use crate::clock::millis_to_datetime;

use super::errors::StoreError;
use super::{SqlxResultExt, Store};

/// One stored chat message.
///
/// `content` is stored verbatim: plain text for most rows, a JSON document
/// for assistant turns that used tools (see [`crate::chat::StoredContent`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    pub id: i64,
    pub creator_id: i64,
    pub role: Role,
    pub content: String,
    pub created_at: i64,
    pub llm_provider: Option<String>,
}

impl ChatRecord {
    /// Creation time as an RFC3339 string.
    pub fn created_rfc3339(&self) -> String {
        millis_to_datetime(self.created_at.max(0) as u64).to_rfc3339()
    }
}

type ChatRow = (i64, i64, String, String, i64, Option<String>);

fn from_row(row: ChatRow) -> Result<ChatRecord> {
    let (id, creator_id, role, content, created_at, llm_provider) = row;
    let role = Role::parse(&role).ok_or(StoreError::InvalidRole { role })?;
    Ok(ChatRecord {
        id,
        creator_id,
        role,
        content,
        created_at,
        llm_provider,
    })
}

impl Store {
    /// Append a message to the user's transcript.
    pub async fn add_chat_message(
        &self,
        user_id: i64,
        role: Role,
        content: &str,
        llm_provider: Option<&str>,
    ) -> Result<ChatRecord> {
        let row: ChatRow = sqlx::query_as(
            "INSERT INTO chat_messages (creator_id, role, content, created_at, llm_provider)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, creator_id, role, content, created_at, llm_provider",
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(content)
        .bind(self.now_millis())
        .bind(llm_provider)
        .fetch_one(self.pool())
        .await
        .sql_context("Failed to store chat message")?;

        from_row(row)
    }

    /// The user's full transcript, oldest first.
    pub async fn chat_history(&self, user_id: i64) -> Result<Vec<ChatRecord>> {
        let rows: Vec<ChatRow> = sqlx::query_as(
            "SELECT id, creator_id, role, content, created_at, llm_provider
             FROM chat_messages WHERE creator_id = $1
             ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .sql_context("Failed to load chat history")?;

        rows.into_iter().map(from_row).collect()
    }

    /// The most recent `limit` messages, returned oldest first.
    pub async fn recent_chat_messages(&self, user_id: i64, limit: usize) -> Result<Vec<ChatRecord>> {
        let rows: Vec<ChatRow> = sqlx::query_as(
            "SELECT id, creator_id, role, content, created_at, llm_provider
             FROM chat_messages WHERE creator_id = $1
             ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await
        .sql_context("Failed to load recent chat messages")?;

        let mut records = rows
            .into_iter()
            .map(from_row)
            .collect::<Result<Vec<_>>>()?;
        records.reverse();
        Ok(records)
    }

    /// Count messages of one role created at or after `since_millis`.
    pub async fn count_chat_messages_since(
        &self,
        user_id: i64,
        role: Role,
        since_millis: i64,
    ) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM chat_messages
             WHERE creator_id = $1 AND role = $2 AND created_at >= $3",
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(since_millis)
        .fetch_one(self.pool())
        .await
        .sql_context("Failed to count chat messages")?;

        Ok(count as usize)
    }

    /// Delete the user's whole transcript, returning how many rows went.
    pub async fn clear_chat_history(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE creator_id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await
            .sql_context("Failed to clear chat history")?;

        tracing::info!(user_id, "Cleared {} chat messages", result.rows_affected());
        Ok(result.rows_affected())
    }
}
