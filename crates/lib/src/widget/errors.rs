//! Error types for the chat client.

use thiserror::Error;

/// Errors talking to the chat endpoints.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("Network error: {source}")]
    Network {
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{}", describe_status(.status, .message))]
    Status {
        /// HTTP status code
        status: u16,
        /// The `error` field of the response body, when present
        message: Option<String>,
    },

    /// A success response could not be decoded.
    #[error("Invalid response from server: {reason}")]
    InvalidResponse {
        /// Decoding failure
        reason: String,
    },

    /// The base URL could not be used.
    #[error("Invalid server URL {url}: {reason}")]
    InvalidUrl {
        /// The URL as given
        url: String,
        /// Parse failure
        reason: String,
    },

    /// Login was rejected.
    #[error("Login failed for {username}")]
    LoginFailed {
        /// The username that was tried
        username: String,
    },
}

fn describe_status(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("Request failed with status {status}"),
    }
}

impl ClientError {
    /// The server-provided error text, if the server sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status, when the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error means the session is missing or expired.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Check if the request failed before reaching the server.
    pub fn is_network_error(&self) -> bool {
        matches!(self, ClientError::Network { .. })
    }
}

impl From<ClientError> for crate::Error {
    fn from(err: ClientError) -> Self {
        crate::Error::Client(err)
    }
}
