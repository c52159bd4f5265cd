//! Error types for chatwire.
//!
//! [`ChatError`] is the single error a consumer of the fragment stream ever
//! sees. Every variant carries plain strings so the error can be cloned into
//! an output fragment and compared in tests.

use thiserror::Error;

/// The main error type for chatwire operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Connect or send failure before any response arrived.
    #[error("Network request failed: {0}")]
    Transport(String),

    /// The completions endpoint answered with a non-2xx status.
    #[error("HTTP error {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Best-effort response body text.
        body: String,
    },

    /// The response carried no readable body.
    #[error("Response has no readable body")]
    EmptyBody,

    /// Reading the response stream failed mid-way.
    #[error("Stream read failed: {0}")]
    Stream(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A message violates the conversation invariants.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl ChatError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid message error.
    #[must_use]
    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::InvalidMessage(msg.into())
    }

    /// Whether the error happened before the response stream was opened.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::HttpStatus { .. } | Self::EmptyBody
        )
    }

    /// Render the error as the `{"error": "..."}` payload consumers receive.
    #[must_use]
    pub fn to_error_json(&self) -> String {
        serde_json::json!({ "error": self.to_string() }).to_string()
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using ChatError.
pub type Result<T> = std::result::Result<T, ChatError>;
