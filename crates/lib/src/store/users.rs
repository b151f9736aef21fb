//! User accounts and per-user preferences.

use serde::Serialize;

use crate::Result;
use crate::auth;

use super::errors::StoreError;
use super::{SqlxResultExt, Store};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2id hash in PHC format, `None` for passwordless accounts
    #[serde(skip)]
    pub password_hash: Option<String>,
    /// Whether tool outcomes are shown as badges in the chat transcript
    pub show_tool_confirmations: bool,
    pub created_at: i64,
}

impl User {
    /// Check if this account can log in without a password.
    pub fn is_passwordless(&self) -> bool {
        self.password_hash.is_none()
    }
}

impl Store {
    /// Register a new account.
    ///
    /// An empty or missing password creates a passwordless account.
    pub async fn create_user(&self, username: &str, password: Option<&str>) -> Result<User> {
        if self.find_user(username).await?.is_some() {
            return Err(StoreError::UsernameTaken {
                username: username.to_string(),
            }
            .into());
        }

        let password_hash = match password.filter(|p| !p.is_empty()) {
            Some(p) => Some(auth::hash_password(p)?),
            None => None,
        };

        let user: User = sqlx::query_as(
            "INSERT INTO users (username, password_hash, show_tool_confirmations, created_at)
             VALUES ($1, $2, 1, $3)
             RETURNING id, username, password_hash, show_tool_confirmations, created_at",
        )
        .bind(username)
        .bind(&password_hash)
        .bind(self.now_millis())
        .fetch_one(self.pool())
        .await
        .sql_context("Failed to create user")?;

        tracing::info!(user_id = user.id, "Created user {}", user.username);
        Ok(user)
    }

    /// Look up an account by username.
    pub async fn find_user(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as(
            "SELECT id, username, password_hash, show_tool_confirmations, created_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .sql_context("Failed to look up user")
    }

    /// Get an account by ID.
    pub async fn user(&self, id: i64) -> Result<User> {
        let user: Option<User> = sqlx::query_as(
            "SELECT id, username, password_hash, show_tool_confirmations, created_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .sql_context("Failed to get user")?;

        user.ok_or_else(|| StoreError::UserIdNotFound { id }.into())
    }

    /// Check credentials and return the account on success.
    ///
    /// Passwordless accounts accept any (or no) password.
    pub async fn authenticate(&self, username: &str, password: Option<&str>) -> Result<User> {
        let user = self
            .find_user(username)
            .await?
            .ok_or_else(|| StoreError::UserNotFound {
                username: username.to_string(),
            })?;

        if let Some(hash) = &user.password_hash {
            auth::verify_password(password.unwrap_or_default(), hash)?;
        }

        Ok(user)
    }

    /// Update whether tool badges are shown to this user.
    pub async fn set_show_tool_confirmations(&self, user_id: i64, show: bool) -> Result<()> {
        let result = sqlx::query("UPDATE users SET show_tool_confirmations = $1 WHERE id = $2")
            .bind(show)
            .bind(user_id)
            .execute(self.pool())
            .await
            .sql_context("Failed to update tool confirmation preference")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserIdNotFound { id: user_id }.into());
        }
        Ok(())
    }
}
