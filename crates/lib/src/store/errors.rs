//! Error types for the intentions store.
//!
//! Structured variants let callers (tools, HTTP handlers) react to specific
//! failures such as a missing intention or a frog conflict without parsing
//! strings.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during store operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQL driver failure.
    #[error("SQL error: {reason}")]
    Sqlx {
        /// Description of the operation that failed
        reason: String,
        /// The underlying sqlx error, if any
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Intention does not exist or belongs to somebody else.
    #[error("Intention with ID {id} not found or doesn't belong to you")]
    IntentionNotFound {
        /// The requested intention ID
        id: i64,
    },

    /// Some intentions in a bulk operation could not be found for the date.
    #[error(
        "Some intentions not found or don't belong to you for {date}. Found {found} out of {expected} intentions."
    )]
    IntentionsMissing {
        /// The date the intentions were expected on
        date: NaiveDate,
        /// Number of matching intentions
        found: usize,
        /// Number of IDs requested
        expected: usize,
    },

    /// A frog already exists for the target date.
    #[error("A frog already exists for {date}: '{title}'. Only one frog per day allowed.")]
    FrogExists {
        /// The date that already has a frog
        date: NaiveDate,
        /// Title of the existing frog
        title: String,
    },

    /// User not found by username.
    #[error("User not found: {username}")]
    UserNotFound {
        /// The username that was looked up
        username: String,
    },

    /// User not found by ID.
    #[error("User not found: #{id}")]
    UserIdNotFound {
        /// The user ID that was looked up
        id: i64,
    },

    /// Username is already registered.
    #[error("Username already exists: {username}")]
    UsernameTaken {
        /// The conflicting username
        username: String,
    },

    /// A stored chat message carries an unknown role.
    #[error("Invalid chat role stored: {role}")]
    InvalidRole {
        /// The role string found in the database
        role: String,
    },

    /// Schema version handling failed.
    #[error("Schema migration failed: {reason}")]
    Migration {
        /// Description of the migration failure
        reason: String,
    },
}

impl StoreError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::IntentionNotFound { .. }
                | StoreError::IntentionsMissing { .. }
                | StoreError::UserNotFound { .. }
                | StoreError::UserIdNotFound { .. }
        )
    }

    /// Check if this error is a uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::FrogExists { .. } | StoreError::UsernameTaken { .. }
        )
    }

    /// Check if this error came from the SQL layer.
    pub fn is_sql_error(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlx { .. } | StoreError::Migration { .. } | StoreError::InvalidRole { .. }
        )
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
