//! Error types for language-model providers.

use thiserror::Error;

/// Errors that can occur while talking to a language model.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmError {
    /// No provider has credentials.
    #[error(
        "No LLM clients available. Please configure ANTHROPIC_API_KEY or OPENAI_API_KEY."
    )]
    NotConfigured,

    /// Transport-level failure reaching the provider.
    #[error("{provider} request failed: {source}")]
    Request {
        /// Provider name
        provider: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// Provider answered with a non-success status.
    #[error("{provider} API error {status}: {body}")]
    Api {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// Provider answered with something that could not be interpreted.
    #[error("{provider} returned an invalid response: {reason}")]
    InvalidResponse {
        /// Provider name
        provider: String,
        /// What was wrong with it
        reason: String,
    },

    /// Scripted provider ran out of canned completions.
    #[error("Scripted provider has no more responses")]
    ScriptExhausted,

    /// Scripted provider was told to fail.
    #[error("{message}")]
    Scripted {
        /// Configured failure message
        message: String,
    },

    /// Both the primary and the fallback provider failed.
    #[error("All LLM providers failed")]
    AllProvidersFailed,

    /// Unknown provider name in configuration.
    #[error("Unknown LLM provider: {name}")]
    UnknownProvider {
        /// The configured name
        name: String,
    },
}

impl LlmError {
    /// Check if this error is a configuration problem rather than a runtime failure.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LlmError::NotConfigured | LlmError::UnknownProvider { .. }
        )
    }

    /// Check if this error came from the remote service.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            LlmError::Request { .. } | LlmError::Api { .. } | LlmError::InvalidResponse { .. }
        )
    }
}

impl From<LlmError> for crate::Error {
    fn from(err: LlmError) -> Self {
        crate::Error::Llm(err)
    }
}
