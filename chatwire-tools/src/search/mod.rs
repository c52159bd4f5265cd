//! Web search tools backed by the Tavily API.
//!
//! [`TavilyClient`] talks to the service; [`SearchTool`] and [`ExtractTool`]
//! expose it to the model as `search_tool` and `extract_tool`.

mod tavily;
mod tools;

pub use tavily::{
    ExtractMode, ExtractOptions, SearchDepth, SearchOptions, TavilyClient, TavilyConfig,
    DEFAULT_BASE_URL,
};
pub use tools::{ExtractTool, SearchTool, EXTRACT_TOOL_NAME, SEARCH_TOOL_NAME};
