//! # chatwire
//!
//! Streaming chat client for OpenAI-compatible completion APIs, with
//! transparent tool calling and optional Tavily-backed web search.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatwire::prelude::*;
//! use futures::StreamExt;
//!
//! # async fn run() -> std::result::Result<(), ChatError> {
//! let orchestrator = ChatOrchestrator::from_config(ChatConfig::from_env()?)?;
//!
//! let mut stream = orchestrator.stream(&[
//!     Message::system("You are a helpful assistant."),
//!     Message::user("What changed in the latest Rust release?"),
//! ]);
//! while let Some(fragment) = stream.next().await {
//!     print!("{}", fragment.to_wire());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `web-search` | `search_tool` / `extract_tool` via the Tavily API | ✅ |
//!
//! ## Architecture
//!
//! chatwire is organized as a workspace of focused crates:
//!
//! - [`chatwire_core`]: messages, errors and configuration
//! - [`chatwire_streaming`]: SSE line parsing over byte streams
//! - [`chatwire_tools`]: the tool trait, registry and web-search tools
//! - [`chatwire_models`]: completion transports (HTTP and scripted)
//! - [`chatwire_agent`]: the exchange state machine and tool dispatch

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use chatwire_agent as agent;
pub use chatwire_models as models;
pub use chatwire_streaming as streaming;
pub use chatwire_tools as tools;

pub use chatwire_agent::{
    ChatFragment, ChatOrchestrator, ChatStream, Conversation, Exchange, FinishReason,
    StreamAccumulator, ToolDispatcher,
};
pub use chatwire_core::{
    ChatConfig, ChatError, ContentPart, GenerationSettings, Message, MessageContent, Role,
    ToolCallRequest, ToolResult,
};
pub use chatwire_models::{CompletionTransport, HttpTransport, MockTransport, ModelError};
pub use chatwire_streaming::{parse_sse_line, SseFrame, SseFrameStream, SseLineBuffer};
pub use chatwire_tools::{
    FunctionTool, SchemaBuilder, Tool, ToolCallResult, ToolDefinition, ToolError, ToolRegistry,
};

#[cfg(feature = "web-search")]
#[cfg_attr(docsrs, doc(cfg(feature = "web-search")))]
pub use chatwire_tools::{ExtractTool, SearchTool, TavilyClient, TavilyConfig};

/// Prelude module for common imports.
pub mod prelude {
    pub use chatwire_agent::{ChatFragment, ChatOrchestrator, ChatStream, Conversation};
    pub use chatwire_core::prelude::*;
    pub use chatwire_tools::{FunctionTool, Tool, ToolCallResult, ToolDefinition, ToolError, ToolRegistry};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
