//! Tool registry for managing named tools.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::{
    definition::ToolDefinition,
    errors::{ToolCallResult, ToolError},
    tool::Tool,
};

/// Registry of tools keyed by name.
///
/// Definitions are reported in registration order, which is also the order
/// they are advertised to the model.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `search_tool` / `extract_tool` pair.
    #[cfg(feature = "web-search")]
    #[must_use]
    pub fn web_search(client: crate::search::TavilyClient) -> Self {
        let client = Arc::new(client);
        let mut registry = Self::new();
        registry
            .register(crate::search::SearchTool::new(Arc::clone(&client)))
            .register(crate::search::ExtractTool::new(client));
        registry
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool, replacing any tool with the same name.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let name = tool.name();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "Replaced previously registered tool");
        }
        self
    }

    /// Get all tool definitions.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Call a tool by name.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` if no tool with the given name exists,
    /// otherwise whatever the tool returns.
    pub async fn call(&self, name: &str, args: JsonValue) -> ToolCallResult {
        let tool = self.get(name).ok_or_else(|| ToolError::not_found(name))?;
        tool.call(args).await
    }

    /// Get a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Check if a tool exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool names.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FunctionTool;
    use serde_json::json;

    fn constant(name: &str, output: &'static str) -> impl Tool {
        FunctionTool::new(
            ToolDefinition::new(name, "constant output"),
            move |_args: JsonValue| async move { Ok::<_, ToolError>(output.to_string()) },
        )
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = ToolRegistry::new();
        registry
            .register(constant("b", "{}"))
            .register(constant("a", "{}"));

        assert_eq!(registry.names(), vec!["b", "a"]);
        let defs: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(defs, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ToolRegistry::new();
        registry
            .register(constant("a", "1"))
            .register(constant("a", "2"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_call() {
        let mut registry = ToolRegistry::new();
        registry.register(constant("a", r#"{"ok":true}"#));
        assert_eq!(registry.call("a", json!({})).await.unwrap(), r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_call_not_found() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        match registry.call("missing", json!({})).await {
            Err(ToolError::NotFound(name)) => assert_eq!(name, "missing"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[cfg(feature = "web-search")]
    #[test]
    fn test_web_search_pair() {
        let registry = ToolRegistry::web_search(crate::search::TavilyClient::new("tvly-test"));
        assert_eq!(registry.names(), vec!["search_tool", "extract_tool"]);
        assert!(registry.contains("search_tool"));
        assert!(!registry.contains("calculator"));
    }
}
