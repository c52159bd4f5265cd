//! Concurrent tool execution.

use chatwire_core::{ToolCallRequest, ToolResult};
use chatwire_tools::{ToolDefinition, ToolRegistry};
use futures::future::join_all;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Executes assembled tool calls against a registry.
///
/// Every failure is folded into an `{"error": ...}` result so the model
/// always receives one answer per call.
#[derive(Debug, Clone, Default)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    /// Create a dispatcher over a registry.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Definitions to offer the model.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Run all calls concurrently; results come back in call order.
    pub async fn dispatch(&self, calls: &[ToolCallRequest]) -> Vec<ToolResult> {
        let futures: Vec<_> = calls.iter().map(|call| self.execute(call)).collect();
        join_all(futures).await
    }

    /// Run a single call.
    pub async fn execute(&self, call: &ToolCallRequest) -> ToolResult {
        let name = call.name();

        let args: JsonValue = match serde_json::from_str(&call.function.arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(tool = %name, call_id = %call.id, error = %e, "Tool arguments are not valid JSON");
                return ToolResult::error(&call.id, name, format!("参数解析错误: {e}"));
            }
        };

        let Some(tool) = self.registry.get(name) else {
            tracing::warn!(tool = %name, call_id = %call.id, "Model requested an unknown tool");
            return ToolResult::error(&call.id, name, format!("未知工具: {name}"));
        };

        tracing::debug!(tool = %name, call_id = %call.id, "Executing tool");
        match tool.call(args).await {
            Ok(content) => ToolResult::new(&call.id, name, content),
            Err(e) => {
                tracing::error!(tool = %name, call_id = %call.id, error = %e, "Tool execution failed");
                ToolResult::error(&call.id, name, format!("工具 {name} 执行失败: {}", e.message()))
            }
        }
    }
}
