//! Conversation message types.
//!
//! These types serialize to the exact shape an OpenAI-compatible completions
//! endpoint expects in its `messages` array.

use serde::{Deserialize, Serialize};

use crate::errors::{ChatError, Result};

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt.
    System,
    /// End user.
    User,
    /// Model output.
    Assistant,
    /// Tool result.
    Tool,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// Message content: a plain string or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content.
    Text(String),
    /// Multi-part content (text and images).
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenated text of the content, ignoring image parts.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect(),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        Self::Parts(parts)
    }
}

/// One part of a multi-part message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text part.
    Text {
        /// The text.
        text: String,
    },
    /// Image reference.
    ImageUrl {
        /// The image location.
        image_url: ImageUrl,
    },
}

impl ContentPart {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image part from a URL or data URI.
    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Image location for an `image_url` part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// URL or `data:` URI of the image.
    pub url: String,
}

/// A tool call issued by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Tool call ID.
    pub id: String,
    /// Tool type, always `function`.
    #[serde(rename = "type", default = "function_type")]
    pub tool_type: String,
    /// Function call details.
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCallRequest {
    /// Create a function tool call.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Name of the called function.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Function name and raw JSON arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// Arguments as a JSON string.
    pub arguments: String,
}

/// Outcome of one tool call, ready to be sent back as a `tool` message.
///
/// `content` is always a JSON string; failures are encoded as
/// `{"error": "..."}` rather than surfaced as Rust errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename = "tool")]
pub struct ToolResult {
    /// ID of the call this result answers.
    pub tool_call_id: String,
    /// Name of the tool that was called.
    pub name: String,
    /// JSON-encoded result.
    pub content: String,
}

impl ToolResult {
    /// Create a result from a tool's JSON output.
    pub fn new(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create an error result with content `{"error": message}`.
    pub fn error(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let content = serde_json::json!({ "error": message.into() }).to_string();
        Self::new(tool_call_id, name, content)
    }

    /// Whether the content is an `{"error": ...}` payload.
    #[must_use]
    pub fn is_error(&self) -> bool {
        serde_json::from_str::<serde_json::Value>(&self.content)
            .ok()
            .and_then(|value| value.get("error").cloned())
            .is_some()
    }
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: Role,
    /// Content; `null` only on an assistant message carrying tool calls.
    #[serde(default)]
    pub content: Option<MessageContent>,
    /// Tool calls made by the assistant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    /// ID of the tool call being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Name of the tool (tool messages) or author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn with_role(role: Role, content: Option<MessageContent>) -> Self {
        Self {
            role,
            content,
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, Some(MessageContent::Text(content.into())))
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, Some(MessageContent::Text(content.into())))
    }

    /// Create a multi-part user message.
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self::with_role(Role::User, Some(MessageContent::Parts(parts)))
    }

    /// Create an assistant text message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, Some(MessageContent::Text(content.into())))
    }

    /// Create an assistant message that defers to tools.
    ///
    /// Empty buffered content is sent as `null`.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        let content = content
            .filter(|text| !text.is_empty())
            .map(MessageContent::Text);
        Self {
            tool_calls: Some(tool_calls),
            ..Self::with_role(Role::Assistant, content)
        }
    }

    /// Plain text of the message, if it has content.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.content.as_ref().map(MessageContent::text)
    }

    /// Check the message invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidMessage`] when content is missing without
    /// tool calls, when tool calls appear on a non-assistant message, or when
    /// a tool message has no `tool_call_id`.
    pub fn validate(&self) -> Result<()> {
        let has_tool_calls = self
            .tool_calls
            .as_ref()
            .is_some_and(|calls| !calls.is_empty());

        if self.content.is_none() && !has_tool_calls {
            return Err(ChatError::invalid_message(format!(
                "{} message has null content and no tool calls",
                self.role.as_str()
            )));
        }
        if has_tool_calls && self.role != Role::Assistant {
            return Err(ChatError::invalid_message(format!(
                "{} message cannot carry tool calls",
                self.role.as_str()
            )));
        }
        if self.role == Role::Tool && self.tool_call_id.is_none() {
            return Err(ChatError::invalid_message(
                "tool message is missing tool_call_id",
            ));
        }
        Ok(())
    }
}

impl From<ToolResult> for Message {
    fn from(result: ToolResult) -> Self {
        Self {
            tool_call_id: Some(result.tool_call_id),
            name: Some(result.name),
            ..Self::with_role(Role::Tool, Some(MessageContent::Text(result.content)))
        }
    }
}
