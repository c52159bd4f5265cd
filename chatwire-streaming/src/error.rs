//! Streaming errors.

use thiserror::Error;

/// Errors that can occur while turning a byte stream into SSE frames.
#[derive(Debug, Error)]
pub enum StreamError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The unterminated line buffer grew past its bound.
    #[error("SSE buffer exceeded {max} bytes")]
    BufferOverflow {
        /// The configured bound.
        max: usize,
    },

    /// The underlying byte stream reported an error.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl StreamError {
    /// Create from any transport error.
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;
