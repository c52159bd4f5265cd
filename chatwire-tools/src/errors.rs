//! Tool-specific error types.

use thiserror::Error;

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool execution failed.
    #[error("Tool execution failed: {message}")]
    ExecutionFailed {
        /// Error message.
        message: String,
    },

    /// Invalid arguments provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool not found in registry.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The tool's HTTP request could not be sent or read.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ToolError {
    /// Create an execution failure.
    #[must_use]
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            message: msg.into(),
        }
    }

    /// Create an invalid arguments error.
    #[must_use]
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// The human-readable message without the variant prefix for failures
    /// raised by the tool itself.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::ExecutionFailed { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(feature = "web-search")]
impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Result of a tool call: the tool's JSON-encoded output.
pub type ToolCallResult = Result<String, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_strips_prefix() {
        let err = ToolError::execution_failed("quota exceeded");
        assert_eq!(err.to_string(), "Tool execution failed: quota exceeded");
        assert_eq!(err.message(), "quota exceeded");
    }

    #[test]
    fn test_message_keeps_other_variants() {
        assert_eq!(
            ToolError::invalid_args("missing query").message(),
            "Invalid arguments: missing query"
        );
        assert_eq!(ToolError::not_found("x").message(), "Tool not found: x");
    }

    #[test]
    fn test_from_anyhow() {
        let err: ToolError = anyhow::anyhow!("boom").into();
        assert_eq!(err.message(), "boom");
    }
}
