//! Scripted transport for testing.
//!
//! [`MockTransport`] replays a queue of [`MockResponse`]s, one per opened
//! request, and records every request it receives.
//!
//! ```rust
//! use chatwire_models::mock::{events, MockResponse, MockTransport};
//!
//! let transport = MockTransport::new().with_response(MockResponse::events([
//!     events::content("4"),
//!     events::finish("stop"),
//! ]));
//! assert_eq!(transport.remaining(), 1);
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::transport::{ByteStream, CompletionTransport};
use crate::types::ChatCompletionRequest;

/// One scripted reply.
#[derive(Debug)]
pub enum MockResponse {
    /// A body delivered as these chunks; an `Err` chunk is a mid-stream read failure.
    Stream(Vec<Result<Bytes, String>>),
    /// The request fails before any byte is read.
    Fail(ModelError),
}

impl MockResponse {
    /// One SSE line per event, followed by `data: [DONE]`.
    pub fn events(events: impl IntoIterator<Item = Value>) -> Self {
        let mut chunks: Vec<Result<Bytes, String>> = events
            .into_iter()
            .map(|event| Ok(Bytes::from(format!("data: {event}\n\n"))))
            .collect();
        chunks.push(Ok(Bytes::from_static(b"data: [DONE]\n\n")));
        Self::Stream(chunks)
    }

    /// One SSE line per event and no `[DONE]` sentinel.
    pub fn events_without_done(events: impl IntoIterator<Item = Value>) -> Self {
        Self::Stream(
            events
                .into_iter()
                .map(|event| Ok(Bytes::from(format!("data: {event}\n\n"))))
                .collect(),
        )
    }

    /// Arbitrary raw body chunks.
    pub fn raw<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Stream(
            chunks
                .into_iter()
                .map(|chunk| Ok(Bytes::from(chunk.into())))
                .collect(),
        )
    }

    /// Fail before the body is read.
    pub fn fail(error: ModelError) -> Self {
        Self::Fail(error)
    }

    /// Append a mid-stream read failure after the scripted chunks.
    #[must_use]
    pub fn then_error(mut self, message: impl Into<String>) -> Self {
        if let Self::Stream(chunks) = &mut self {
            chunks.push(Err(message.into()));
        }
        self
    }
}

/// Transport that replays scripted responses.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
}

impl MockTransport {
    /// Create a transport with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    #[must_use]
    pub fn with_response(self, response: MockResponse) -> Self {
        self.push(response);
        self
    }

    /// Queue a response through a shared handle.
    pub fn push(&self, response: MockResponse) {
        self.responses.lock().push_back(response);
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl CompletionTransport for MockTransport {
    async fn open(&self, request: &ChatCompletionRequest) -> ModelResult<ByteStream> {
        self.requests.lock().push(request.clone());

        let response = self.responses.lock().pop_front();
        match response {
            Some(MockResponse::Stream(chunks)) => Ok(Box::pin(futures::stream::iter(
                chunks
                    .into_iter()
                    .map(|chunk| chunk.map_err(ModelError::Stream)),
            ))),
            Some(MockResponse::Fail(error)) => Err(error),
            None => Err(ModelError::Configuration(
                "MockTransport has no scripted response left".to_string(),
            )),
        }
    }
}

/// Builders for provider-shaped streaming events.
pub mod events {
    use serde_json::{json, Value};

    fn chunk(delta: Value, finish_reason: Option<&str>) -> Value {
        json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion.chunk",
            "model": "mock",
            "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
        })
    }

    /// The opening `role: assistant` delta.
    pub fn role() -> Value {
        chunk(json!({"role": "assistant"}), None)
    }

    /// A text delta.
    pub fn content(text: &str) -> Value {
        chunk(json!({ "content": text }), None)
    }

    /// A single tool call fragment; absent parts are omitted.
    pub fn tool_call(
        index: u32,
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) -> Value {
        let mut call = json!({ "index": index, "function": {} });
        if let Some(id) = id {
            call["id"] = json!(id);
            call["type"] = json!("function");
        }
        if let Some(name) = name {
            call["function"]["name"] = json!(name);
        }
        if let Some(arguments) = arguments {
            call["function"]["arguments"] = json!(arguments);
        }
        chunk(json!({ "tool_calls": [call] }), None)
    }

    /// A complete tool call in one fragment.
    pub fn full_tool_call(index: u32, id: &str, name: &str, arguments: &str) -> Value {
        tool_call(index, Some(id), Some(name), Some(arguments))
    }

    /// An empty delta carrying a finish reason.
    pub fn finish(reason: &str) -> Value {
        chunk(json!({}), Some(reason))
    }

    /// An event with an empty `choices` array.
    pub fn empty_choices() -> Value {
        json!({ "id": "chatcmpl-mock", "choices": [] })
    }
}
