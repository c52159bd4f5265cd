//! Stream accumulation and tool-call assembly.
//!
//! One [`StreamAccumulator`] consumes the parsed events of one completion
//! stream. Text is either passed straight through or held back, depending on
//! whether the model may still decide to call a tool. Tool-call fragments are
//! merged by their `index` until the stream finishes.

use chatwire_core::ToolCallRequest;
use chatwire_models::{ChatCompletionChunk, ChunkToolCall};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural end of the answer.
    Stop,
    /// The model wants tools to run.
    ToolCalls,
    /// Token limit reached.
    Length,
    /// Output was filtered.
    ContentFilter,
    /// Any other provider-specific reason.
    Other(String),
}

impl FinishReason {
    /// Parse a wire value.
    #[must_use]
    pub fn parse(reason: &str) -> Self {
        match reason {
            "stop" => Self::Stop,
            "tool_calls" => Self::ToolCalls,
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the reason ends the response stream.
    ///
    /// Unrecognised reasons are informational and the stream keeps going.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Wire value of the reason.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stop => "stop",
            Self::ToolCalls => "tool_calls",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
            Self::Other(other) => other,
        }
    }
}

/// What one event contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingested {
    /// Text to forward right away.
    pub text: Option<String>,
    /// Finish reason carried by the event.
    pub finish_reason: Option<FinishReason>,
}

/// A tool call being assembled from fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallBuilder {
    /// Call ID; the last fragment carrying one wins.
    pub id: String,
    /// Concatenated name fragments.
    pub name: String,
    /// Concatenated argument fragments.
    pub arguments: String,
}

impl ToolCallBuilder {
    /// Merge one fragment.
    pub fn merge(&mut self, fragment: &ChunkToolCall) {
        if let Some(id) = &fragment.id {
            self.id.clone_from(id);
        }
        if let Some(function) = &fragment.function {
            if let Some(name) = &function.name {
                self.name.push_str(name);
            }
            if let Some(arguments) = &function.arguments {
                self.arguments.push_str(arguments);
            }
        }
    }

    /// Whether both the id and the name arrived.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty()
    }

    /// Finish the call, or `None` if it is incomplete.
    pub fn build(self) -> Option<ToolCallRequest> {
        self.is_complete()
            .then(|| ToolCallRequest::new(self.id, self.name, self.arguments))
    }
}

/// Accumulates one completion stream.
#[derive(Debug, Clone)]
pub struct StreamAccumulator {
    tools_enabled: bool,
    buffered: String,
    tool_calls: BTreeMap<u32, ToolCallBuilder>,
}

impl StreamAccumulator {
    /// Create an accumulator; with tools enabled, text is buffered.
    #[must_use]
    pub fn new(tools_enabled: bool) -> Self {
        Self {
            tools_enabled,
            buffered: String::new(),
            tool_calls: BTreeMap::new(),
        }
    }

    /// Whether text is being held back for a possible tool call.
    #[must_use]
    pub fn tools_enabled(&self) -> bool {
        self.tools_enabled
    }

    /// Switch buffering on or off for subsequent events.
    pub fn set_tools_enabled(&mut self, enabled: bool) {
        self.tools_enabled = enabled;
    }

    /// Consume one provider event.
    ///
    /// Events without a first choice, or that do not look like a chunk at
    /// all, contribute nothing.
    pub fn ingest(&mut self, event: &Value) -> Ingested {
        let chunk = match ChatCompletionChunk::deserialize(event) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping event that is not a completion chunk");
                return Ingested::default();
            }
        };

        let Some(choice) = chunk.choices.into_iter().next() else {
            return Ingested::default();
        };

        let mut ingested = Ingested {
            text: None,
            finish_reason: choice
                .finish_reason
                .as_deref()
                .filter(|reason| !reason.is_empty())
                .map(FinishReason::parse),
        };

        if let Some(delta) = choice.delta {
            if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
                if self.tools_enabled {
                    self.buffered.push_str(&content);
                } else {
                    ingested.text = Some(content);
                }
            }

            for fragment in delta.tool_calls.unwrap_or_default() {
                self.tool_calls
                    .entry(fragment.index)
                    .or_default()
                    .merge(&fragment);
            }
        }

        ingested
    }

    /// Take the assembled tool calls in index order, dropping incomplete ones.
    pub fn take_tool_calls(&mut self) -> Vec<ToolCallRequest> {
        std::mem::take(&mut self.tool_calls)
            .into_iter()
            .filter_map(|(index, builder)| {
                let call = builder.clone().build();
                if call.is_none() {
                    tracing::warn!(
                        index,
                        id = %builder.id,
                        name = %builder.name,
                        "Dropping incomplete tool call"
                    );
                }
                call
            })
            .collect()
    }

    /// Take the held-back text, if any.
    pub fn take_buffered_content(&mut self) -> Option<String> {
        let content = std::mem::take(&mut self.buffered);
        (!content.is_empty()).then_some(content)
    }

    /// Whether text is being held back.
    #[must_use]
    pub fn has_buffered_content(&self) -> bool {
        !self.buffered.is_empty()
    }

    /// Number of tool calls being assembled.
    #[must_use]
    pub fn pending_tool_calls(&self) -> usize {
        self.tool_calls.len()
    }

    /// Clear buffered text and tool calls.
    pub fn reset(&mut self) {
        self.buffered.clear();
        self.tool_calls.clear();
    }
}
