//! # chatwire-models
//!
//! Transport layer for OpenAI-compatible streaming chat completions.
//!
//! - [`ChatCompletionRequest`] and the streaming chunk types
//! - [`CompletionTransport`]: opens one request, returns the raw body stream
//! - [`HttpTransport`]: `reqwest` implementation with Bearer auth
//! - [`mock::MockTransport`]: scripted SSE bodies for tests

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod mock;
pub mod transport;
pub mod types;

pub use error::{ModelError, ModelResult};
pub use mock::{MockResponse, MockTransport};
pub use transport::{ByteStream, CompletionTransport, HttpTransport};
pub use types::{
    ChatCompletionChunk, ChatCompletionRequest, ChatTool, ChunkChoice, ChunkDelta, ChunkFunction,
    ChunkToolCall, FunctionDefinition,
};
