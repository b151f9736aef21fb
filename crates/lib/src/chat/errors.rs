//! Error types for the chat service.

use thiserror::Error;

/// Errors raised while handling a chat request.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ChatError {
    /// The submitted message was empty or whitespace.
    #[error("Message cannot be empty")]
    EmptyMessage,

    /// The user already sent the maximum number of messages today.
    #[error("Daily message limit ({limit}) reached")]
    RateLimited {
        /// Configured per-day limit
        limit: usize,
    },
}

impl ChatError {
    /// Check if the request itself was malformed.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, ChatError::EmptyMessage)
    }

    /// Check if this error is a rate-limit rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ChatError::RateLimited { .. })
    }
}

impl From<ChatError> for crate::Error {
    fn from(err: ChatError) -> Self {
        crate::Error::Chat(err)
    }
}
