//! The `search_tool` and `extract_tool` tools offered to the model.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::tavily::{ExtractOptions, SearchOptions, TavilyClient};
use crate::{
    definition::ToolDefinition, errors::ToolCallResult, schema::SchemaBuilder, Tool, ToolError,
};

/// Name of the web search tool.
pub const SEARCH_TOOL_NAME: &str = "search_tool";

/// Name of the content extraction tool.
pub const EXTRACT_TOOL_NAME: &str = "extract_tool";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    options: Option<SearchOptions>,
}

#[derive(Debug, Deserialize)]
struct ExtractArgs {
    urls: Vec<String>,
    #[serde(default)]
    options: Option<ExtractOptions>,
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: &str, args: JsonValue) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::invalid_args(format!("{tool}: {e}")))
}

/// Web search through Tavily.
#[derive(Debug, Clone)]
pub struct SearchTool {
    client: Arc<TavilyClient>,
}

impl SearchTool {
    /// Create the tool around a shared client.
    #[must_use]
    pub fn new(client: Arc<TavilyClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn definition(&self) -> ToolDefinition {
        let options = SchemaBuilder::new()
            .boolean("includeAnswer", "Include a generated short answer", false)
            .integer_constrained(
                "maxResults",
                "Maximum number of results to return (default: 5)",
                false,
                Some(1),
                Some(20),
            )
            .enum_values(
                "searchDepth",
                "Search depth: 'basic' (faster) or 'advanced' (more comprehensive)",
                &["basic", "advanced"],
                false,
            )
            .boolean("includeRawContent", "Include the raw page content", false)
            .boolean("includeImages", "Include related images", false)
            .string_array("includeDomains", "Only search these domains", false)
            .string_array("excludeDomains", "Never return results from these domains", false)
            .build();

        ToolDefinition::new(
            SEARCH_TOOL_NAME,
            "Search the web for up-to-date information. Use this when the question \
             needs current events, facts you are unsure of, or sources.",
        )
        .with_parameters(
            SchemaBuilder::new()
                .string("query", "The search query", true)
                .object("options", "Optional search settings", options, false)
                .build(),
        )
    }

    async fn call(&self, args: JsonValue) -> ToolCallResult {
        let args: SearchArgs = parse_args(SEARCH_TOOL_NAME, args)?;
        let query = args.query.trim();
        if query.is_empty() {
            return Err(ToolError::invalid_args("query cannot be empty"));
        }

        let options = args.options.unwrap_or_default();
        tracing::info!(
            query = %query,
            depth = ?options.search_depth,
            max_results = options.max_results,
            "Running web search"
        );

        let result = self.client.search(query, &options).await?;
        Ok(serde_json::to_string(&result)?)
    }
}

/// Page content extraction through Tavily.
#[derive(Debug, Clone)]
pub struct ExtractTool {
    client: Arc<TavilyClient>,
}

impl ExtractTool {
    /// Create the tool around a shared client.
    #[must_use]
    pub fn new(client: Arc<TavilyClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ExtractTool {
    fn definition(&self) -> ToolDefinition {
        let options = SchemaBuilder::new()
            .boolean("includeRawContent", "Include the raw page content", false)
            .enum_values(
                "extractMode",
                "What to extract: 'article', 'code' or 'auto'",
                &["article", "code", "auto"],
                false,
            )
            .build();

        ToolDefinition::new(
            EXTRACT_TOOL_NAME,
            "Extract the readable content of one or more web pages given their URLs.",
        )
        .with_parameters(
            SchemaBuilder::new()
                .string_array("urls", "URLs of the pages to extract", true)
                .object("options", "Optional extraction settings", options, false)
                .build(),
        )
    }

    async fn call(&self, args: JsonValue) -> ToolCallResult {
        let args: ExtractArgs = parse_args(EXTRACT_TOOL_NAME, args)?;
        if args.urls.is_empty() {
            return Err(ToolError::invalid_args("urls cannot be empty"));
        }

        let options = args.options.unwrap_or_default();
        tracing::info!(urls = args.urls.len(), mode = ?options.extract_mode, "Extracting pages");

        let result = self.client.extract(&args.urls, &options).await?;
        Ok(serde_json::to_string(&result)?)
    }
}
