//! Streaming chat orchestration for chatwire.
//!
//! The orchestrator turns a conversation into a stream of visible text while
//! transparently handling tool calls:
//!
//! - [`StreamAccumulator`] reads completion events, holds back text while a
//!   tool call is possible and assembles tool-call fragments
//! - [`ToolDispatcher`] runs the assembled calls concurrently
//! - [`Exchange`] is the state machine tying both to a transport, and
//!   [`ChatStream`] exposes it as a `Stream`
//! - [`Conversation`] is a small caller-owned history helper
//!
//! # Example
//!
//! ```rust
//! use chatwire_agent::{ChatFragment, ChatOrchestrator};
//! use chatwire_core::{ChatConfig, Message};
//! use chatwire_models::mock::{events, MockResponse, MockTransport};
//! use chatwire_tools::ToolRegistry;
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let transport = MockTransport::new().with_response(MockResponse::events([
//!     events::content("4"),
//!     events::finish("stop"),
//! ]));
//! let orchestrator =
//!     ChatOrchestrator::new(ChatConfig::new("sk-test"), Arc::new(transport), ToolRegistry::new());
//!
//! let fragments: Vec<ChatFragment> = orchestrator
//!     .stream(&[Message::user("2+2?")])
//!     .collect()
//!     .await;
//! assert_eq!(fragments, vec![ChatFragment::Text("4".into())]);
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod accumulator;
pub mod dispatch;
pub mod fragment;
pub mod history;
pub mod orchestrator;

pub use accumulator::{FinishReason, Ingested, StreamAccumulator, ToolCallBuilder};
pub use dispatch::ToolDispatcher;
pub use fragment::ChatFragment;
pub use history::Conversation;
pub use orchestrator::{ChatOrchestrator, ChatStream, Exchange};
