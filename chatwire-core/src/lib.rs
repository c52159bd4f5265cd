//! # chatwire-core
//!
//! Core types shared by every chatwire crate:
//!
//! - **Messages**: [`Message`], [`MessageContent`], [`ContentPart`], tool call
//!   requests and tool results in their OpenAI-compatible wire shape
//! - **Errors**: [`ChatError`], the one error type a stream consumer sees
//! - **Config**: [`ChatConfig`] and [`GenerationSettings`]
//!
//! ## Example
//!
//! ```rust
//! use chatwire_core::{ChatConfig, Message};
//!
//! let config = ChatConfig::new("sk-test").with_model("gpt-4o-mini");
//! assert!(config.validate().is_ok());
//!
//! let history = vec![Message::system("Be brief."), Message::user("2+2?")];
//! assert!(history.iter().all(|m| m.validate().is_ok()));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod messages;

pub use config::{ChatConfig, GenerationSettings, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use errors::{ChatError, Result};
pub use messages::{
    ContentPart, FunctionCall, ImageUrl, Message, MessageContent, Role, ToolCallRequest,
    ToolResult,
};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::config::{ChatConfig, GenerationSettings};
    pub use crate::errors::{ChatError, Result};
    pub use crate::messages::{
        ContentPart, Message, MessageContent, Role, ToolCallRequest, ToolResult,
    };
}
