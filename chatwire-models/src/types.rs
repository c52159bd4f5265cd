//! OpenAI-compatible chat completions wire types.

use chatwire_core::{ChatConfig, Message};
use chatwire_tools::{ObjectJsonSchema, ToolDefinition};
use serde::{Deserialize, Serialize};

/// Streaming chat completion request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model ID.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Always `true`; the orchestrator only consumes streams.
    pub stream: bool,
    /// Sampling temperature.
    pub temperature: f64,
    /// Top-p sampling.
    pub top_p: f64,
    /// Tools available to the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatTool>>,
    /// Tool choice strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

impl ChatCompletionRequest {
    /// Build a streaming request without tools.
    pub fn streaming(config: &ChatConfig, messages: Vec<Message>) -> Self {
        Self {
            model: config.model.clone(),
            messages,
            stream: true,
            temperature: config.settings.temperature,
            top_p: config.settings.top_p,
            tools: None,
            tool_choice: None,
        }
    }

    /// Offer tools to the model with `tool_choice: "auto"`.
    ///
    /// An empty slice leaves the request without tools.
    #[must_use]
    pub fn with_tools(mut self, definitions: &[ToolDefinition]) -> Self {
        if definitions.is_empty() {
            return self;
        }
        self.tools = Some(definitions.iter().map(ChatTool::from).collect());
        self.tool_choice = Some("auto".to_string());
        self
    }

    /// Whether tools are offered in this request.
    #[must_use]
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|tools| !tools.is_empty())
    }
}

/// Tool definition in request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTool {
    /// Tool type, always `function`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function definition.
    pub function: FunctionDefinition,
}

/// Function definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name.
    pub name: String,
    /// Function description.
    pub description: String,
    /// Parameter schema.
    pub parameters: ObjectJsonSchema,
}

impl From<&ToolDefinition> for ChatTool {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

/// Streaming chunk.
///
/// Every field is optional so provider variations deserialize instead of
/// failing the whole event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionChunk {
    /// Chunk ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Model used.
    #[serde(default)]
    pub model: Option<String>,
    /// Chunk choices.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// Choice in a streaming chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,
    /// Delta content.
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
    /// Finish reason.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Delta content in a streaming chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    /// Role (first chunk only).
    #[serde(default)]
    pub role: Option<String>,
    /// Content delta.
    #[serde(default)]
    pub content: Option<String>,
    /// Tool call fragments.
    #[serde(default)]
    pub tool_calls: Option<Vec<ChunkToolCall>>,
}

/// Tool call fragment in a streaming chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkToolCall {
    /// Position of the call this fragment belongs to.
    #[serde(default)]
    pub index: u32,
    /// Tool call ID (first fragment only, usually).
    #[serde(default)]
    pub id: Option<String>,
    /// Tool type.
    #[serde(rename = "type", default)]
    pub tool_type: Option<String>,
    /// Function fragment.
    #[serde(default)]
    pub function: Option<ChunkFunction>,
}

/// Function fragment in a streaming chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkFunction {
    /// Name fragment.
    #[serde(default)]
    pub name: Option<String>,
    /// Arguments fragment.
    #[serde(default)]
    pub arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatwire_tools::SchemaBuilder;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_without_tools() {
        let config = ChatConfig::new("k").with_model("m");
        let request = ChatCompletionRequest::streaming(&config, vec![Message::user("hi")]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true,
                "temperature": 0.7,
                "top_p": 1.0
            })
        );
        assert!(!request.has_tools());
    }

    #[test]
    fn test_request_with_tools() {
        let def = ToolDefinition::new("search_tool", "Search")
            .with_parameters(SchemaBuilder::new().string("query", "q", true).build());
        let request = ChatCompletionRequest::streaming(&ChatConfig::new("k"), vec![])
            .with_tools(&[def]);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(
            body["tools"][0],
            json!({
                "type": "function",
                "function": {
                    "name": "search_tool",
                    "description": "Search",
                    "parameters": {
                        "type": "object",
                        "properties": {"query": {"type": "string", "description": "q"}},
                        "required": ["query"]
                    }
                }
            })
        );
    }

    #[test]
    fn test_empty_tools_omitted() {
        let request = ChatCompletionRequest::streaming(&ChatConfig::new("k"), vec![]).with_tools(&[]);
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_chunk_tolerates_nulls() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "id": "c1",
            "choices": [{"index": 0, "delta": null, "finish_reason": null}]
        }))
        .unwrap();
        assert!(chunk.choices[0].delta.is_none());

        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{"delta": {"tool_calls": [{"index": 1, "function": {"arguments": "{\"q"}}]}}]
        }))
        .unwrap();
        let call = &chunk.choices[0].delta.as_ref().unwrap().tool_calls.as_ref().unwrap()[0];
        assert_eq!(call.index, 1);
        assert!(call.id.is_none());
        assert_eq!(call.function.as_ref().unwrap().arguments.as_deref(), Some("{\"q"));
    }
}
