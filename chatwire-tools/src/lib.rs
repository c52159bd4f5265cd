//! # chatwire-tools
//!
//! Tool system for chatwire.
//!
//! - **[`Tool`]**: trait for callable tools taking JSON arguments and
//!   returning a JSON string
//! - **[`ToolRegistry`]**: name-keyed lookup with explicit unknown-name errors
//! - **[`ToolDefinition`]** / **[`SchemaBuilder`]**: schemas advertised to the model
//! - **`search`** (feature `web-search`): the Tavily-backed `search_tool` and
//!   `extract_tool`
//!
//! ## Example
//!
//! ```rust
//! use chatwire_tools::{FunctionTool, SchemaBuilder, ToolDefinition, ToolError, ToolRegistry};
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(FunctionTool::new(
//!     ToolDefinition::new("echo", "Echo the input back")
//!         .with_parameters(SchemaBuilder::new().string("text", "Text", true).build()),
//!     |args: serde_json::Value| async move { Ok::<_, ToolError>(args.to_string()) },
//! ));
//! assert!(registry.contains("echo"));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod definition;
pub mod errors;
pub mod registry;
pub mod schema;
#[cfg(feature = "web-search")]
pub mod search;
pub mod tool;

pub use definition::{ObjectJsonSchema, ToolDefinition};
pub use errors::{ToolCallResult, ToolError};
pub use registry::ToolRegistry;
pub use schema::SchemaBuilder;
pub use tool::{FunctionTool, Tool};

#[cfg(feature = "web-search")]
pub use search::{ExtractTool, SearchTool, TavilyClient, TavilyConfig};
