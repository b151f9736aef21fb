//! Authentication error types.

use thiserror::Error as ThisError;

use crate::Error;

/// Errors that can occur while hashing or checking credentials.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum AuthError {
    /// Password hashing failed.
    #[error("Password hashing failed: {reason}")]
    HashingFailed {
        /// Description of the hashing failure
        reason: String,
    },

    /// The stored hash could not be parsed.
    #[error("Password verification failed")]
    PasswordVerificationFailed,

    /// The supplied password did not match.
    #[error("Invalid password")]
    InvalidPassword,
}

impl AuthError {
    /// Check if this error means the caller supplied wrong credentials.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, AuthError::InvalidPassword)
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::Auth(err)
    }
}
