//! Transport error types.

use chatwire_core::ChatError;
use chatwire_streaming::StreamError;
use thiserror::Error;

/// Errors raised while opening or reading a completion stream.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Connect or send failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP error from the API.
    #[error("HTTP error: {status} - {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Successful status but nothing to read.
    #[error("Response has no body")]
    EmptyBody,

    /// Reading the body failed after the stream opened.
    #[error("Stream error: {0}")]
    Stream(String),

    /// Invalid transport configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    /// Create an HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a stream error.
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_body() || err.is_decode() {
            ModelError::Stream(err.to_string())
        } else if let Some(status) = err.status() {
            ModelError::http(status.as_u16(), err.to_string())
        } else if err.is_builder() {
            ModelError::Configuration(err.to_string())
        } else {
            ModelError::Connection(err.to_string())
        }
    }
}

impl From<StreamError> for ModelError {
    fn from(err: StreamError) -> Self {
        ModelError::Stream(err.to_string())
    }
}

impl From<ModelError> for ChatError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Connection(msg) => ChatError::Transport(msg),
            ModelError::Http { status, body } => ChatError::HttpStatus { status, body },
            ModelError::EmptyBody => ChatError::EmptyBody,
            ModelError::Stream(msg) => ChatError::Stream(msg),
            ModelError::Configuration(msg) => ChatError::Configuration(msg),
            ModelError::Serialization(e) => ChatError::Serialization(e.to_string()),
        }
    }
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
