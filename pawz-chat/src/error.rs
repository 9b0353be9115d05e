//! Chat error types.

use thiserror::Error;

/// Errors that can occur while asking a backend for a reply.
///
/// None of these reach the user; [`ChatService`](crate::ChatService) turns
/// every one into a canned fallback reply.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP request failed.
    #[error("chat request failed: {0}")]
    RequestFailed(String),

    /// Backend response was not the expected JSON.
    #[error("failed to parse chat response: {0}")]
    ParseError(String),

    /// Backend returned no usable text.
    #[error("chat backend returned an empty reply")]
    EmptyReply,

    /// Request did not complete within the configured window.
    #[error("chat request timed out after {0}ms")]
    Timeout(u64),

    /// No backend is configured or reachable.
    #[error("chat provider unavailable: {0}")]
    Unavailable(String),

    /// All retry attempts exhausted.
    #[error("all chat retry attempts exhausted after {attempts} tries: {last_error}")]
    RetriesExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// Error from the final attempt.
        last_error: String,
    },

    /// Configuration error.
    #[error("chat configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout(0)
        } else if err.is_connect() {
            ChatError::Unavailable(err.to_string())
        } else {
            ChatError::RequestFailed(err.to_string())
        }
    }
}
