//! Core tool trait and a closure-backed implementation.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::fmt;
use std::future::Future;

use crate::{definition::ToolDefinition, errors::ToolCallResult};

/// Core trait for all tools.
///
/// A tool receives its already-parsed JSON arguments and returns its output
/// as a JSON string, which is forwarded to the model unchanged.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use chatwire_tools::{Tool, ToolCallResult, ToolDefinition};
///
/// struct Clock;
///
/// #[async_trait]
/// impl Tool for Clock {
///     fn definition(&self) -> ToolDefinition {
///         ToolDefinition::new("clock", "Current time")
///     }
///
///     async fn call(&self, _args: serde_json::Value) -> ToolCallResult {
///         Ok(r#"{"time":"12:00"}"#.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments.
    async fn call(&self, args: JsonValue) -> ToolCallResult;

    /// Get the tool name.
    fn name(&self) -> String {
        self.definition().name
    }
}

/// A tool backed by an async closure.
pub struct FunctionTool<F> {
    definition: ToolDefinition,
    function: F,
}

impl<F, Fut> FunctionTool<F>
where
    F: Fn(JsonValue) -> Fut + Send + Sync,
    Fut: Future<Output = ToolCallResult> + Send + 'static,
{
    /// Create a new function tool.
    pub fn new(definition: ToolDefinition, function: F) -> Self {
        Self {
            definition,
            function,
        }
    }
}

impl<F> fmt::Debug for FunctionTool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.definition.name)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> Tool for FunctionTool<F>
where
    F: Fn(JsonValue) -> Fut + Send + Sync,
    Fut: Future<Output = ToolCallResult> + Send + 'static,
{
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn call(&self, args: JsonValue) -> ToolCallResult {
        (self.function)(args).await
    }

    fn name(&self) -> String {
        self.definition.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SchemaBuilder, ToolError};

    #[tokio::test]
    async fn test_function_tool() {
        let tool = FunctionTool::new(
            ToolDefinition::new("echo", "Echo back")
                .with_parameters(SchemaBuilder::new().string("text", "Text", true).build()),
            |args: JsonValue| async move {
                let result: ToolCallResult = match args["text"].as_str() {
                    Some(text) => Ok(serde_json::json!({ "echo": text }).to_string()),
                    None => Err(ToolError::invalid_args("missing text")),
                };
                result
            },
        );

        assert_eq!(tool.name(), "echo");
        assert_eq!(
            tool.call(serde_json::json!({"text": "hi"})).await.unwrap(),
            r#"{"echo":"hi"}"#
        );
        assert!(matches!(
            tool.call(serde_json::json!({})).await,
            Err(ToolError::InvalidArguments(_))
        ));
    }
}
