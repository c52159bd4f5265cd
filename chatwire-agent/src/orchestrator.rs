//! The chat exchange state machine.
//!
//! An [`Exchange`] turns one conversation snapshot into a sequence of
//! [`ChatFragment`]s. It streams the completion, runs requested tools,
//! feeds their results back and continues until the model stops:
//!
//! ```text
//! Connecting ──▶ Streaming ──(tool_calls)──▶ Dispatching ──▶ Connecting ...
//!      │              │
//!      └── error ─────┴── stop / EOF / error ──▶ Done
//! ```
//!
//! Nothing is spawned. Work only happens while the caller awaits
//! [`Exchange::next_fragment`] or polls a [`ChatStream`].

use chatwire_core::{ChatConfig, ChatError, Message};
use chatwire_models::{ByteStream, ChatCompletionRequest, CompletionTransport, HttpTransport};
use chatwire_streaming::{SseFrame, SseFrameStream};
use chatwire_tools::ToolRegistry;
use futures::future::BoxFuture;
use futures::{ready, Stream, StreamExt};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use uuid::Uuid;

use crate::accumulator::{FinishReason, StreamAccumulator};
use crate::dispatch::ToolDispatcher;
use crate::fragment::ChatFragment;
use crate::history::Conversation;

/// Drives chat exchanges against a completions endpoint.
///
/// # Example
///
/// ```rust,no_run
/// use chatwire_agent::{ChatOrchestrator, Conversation};
/// use chatwire_core::ChatConfig;
///
/// # async fn run() -> Result<(), chatwire_core::ChatError> {
/// let orchestrator = ChatOrchestrator::from_config(ChatConfig::from_env()?)?;
/// let mut conversation = Conversation::new().with_system_prompt("Be brief.");
/// conversation.push_user("2+2?");
/// let answer = orchestrator.complete(&mut conversation).await?;
/// println!("{answer}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatOrchestrator {
    config: ChatConfig,
    transport: Arc<dyn CompletionTransport>,
    dispatcher: ToolDispatcher,
}

impl ChatOrchestrator {
    /// Create an orchestrator from its parts.
    pub fn new(
        config: ChatConfig,
        transport: Arc<dyn CompletionTransport>,
        registry: ToolRegistry,
    ) -> Self {
        Self {
            config,
            transport,
            dispatcher: ToolDispatcher::new(Arc::new(registry)),
        }
    }

    /// Create an orchestrator talking HTTP, with the web-search tools when a
    /// search key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Configuration`] if the configuration is invalid.
    pub fn from_config(config: ChatConfig) -> Result<Self, ChatError> {
        config.validate()?;

        let transport = Arc::new(HttpTransport::from_config(&config));
        let registry = web_search_registry(&config);

        tracing::info!(
            endpoint = %config.endpoint,
            model = %config.model,
            tools = registry.len(),
            "Chat orchestrator configured"
        );
        Ok(Self::new(config, transport, registry))
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// The registered tools.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        self.dispatcher.registry()
    }

    /// Start an exchange over a copy of `history`.
    #[must_use]
    pub fn exchange(&self, history: &[Message]) -> Exchange {
        Exchange::new(
            self.config.clone(),
            Arc::clone(&self.transport),
            self.dispatcher.clone(),
            history.to_vec(),
        )
    }

    /// Start an exchange and expose it as a fragment stream.
    #[must_use]
    pub fn stream(&self, history: &[Message]) -> ChatStream {
        ChatStream::new(self.exchange(history))
    }

    /// Run one exchange to completion and append the answer.
    ///
    /// The visible text is appended as an assistant message and returned.
    /// Tool rounds are not recorded in the conversation.
    ///
    /// # Errors
    ///
    /// Returns the error of an error fragment; the conversation is left
    /// unchanged in that case.
    pub async fn complete(&self, conversation: &mut Conversation) -> Result<String, ChatError> {
        let mut exchange = self.exchange(conversation.messages());
        let mut answer = String::new();

        while let Some(fragment) = exchange.next_fragment().await {
            match fragment {
                ChatFragment::Text(text) => answer.push_str(&text),
                ChatFragment::Error(err) => return Err(err),
            }
        }

        if !answer.is_empty() {
            conversation.push_assistant(answer.clone());
        }
        Ok(answer)
    }
}

#[cfg(feature = "web-search")]
fn web_search_registry(config: &ChatConfig) -> ToolRegistry {
    match &config.search_api_key {
        Some(key) => ToolRegistry::web_search(chatwire_tools::TavilyClient::new(key.clone())),
        None => ToolRegistry::new(),
    }
}

#[cfg(not(feature = "web-search"))]
fn web_search_registry(config: &ChatConfig) -> ToolRegistry {
    if config.search_api_key.is_some() {
        tracing::warn!("Search API key set but the web-search feature is disabled");
    }
    ToolRegistry::new()
}

impl fmt::Debug for ChatOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatOrchestrator")
            .field("endpoint", &self.config.endpoint)
            .field("model", &self.config.model)
            .field("tools", &self.dispatcher.registry())
            .finish_non_exhaustive()
    }
}

enum Phase {
    Connecting,
    Streaming(SseFrameStream<ByteStream>),
    Dispatching,
    Done,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Streaming(_) => "streaming",
            Self::Dispatching => "dispatching",
            Self::Done => "done",
        }
    }
}

/// One user turn, including any tool rounds it triggers.
pub struct Exchange {
    id: Uuid,
    config: ChatConfig,
    transport: Arc<dyn CompletionTransport>,
    dispatcher: ToolDispatcher,
    history: Vec<Message>,
    accumulator: StreamAccumulator,
    phase: Phase,
    tool_rounds: u32,
    requests: u32,
}

impl Exchange {
    /// Create an exchange over a working copy of the history.
    pub fn new(
        config: ChatConfig,
        transport: Arc<dyn CompletionTransport>,
        dispatcher: ToolDispatcher,
        history: Vec<Message>,
    ) -> Self {
        let tools_active =
            config.tools_enabled && !dispatcher.is_empty() && config.max_tool_rounds > 0;

        Self {
            id: Uuid::new_v4(),
            config,
            transport,
            dispatcher,
            history,
            accumulator: StreamAccumulator::new(tools_active),
            phase: Phase::Connecting,
            tool_rounds: 0,
            requests: 0,
        }
    }

    /// Exchange ID used in log records.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Working history, including assistant tool calls and tool results.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Consume the exchange and return its working history.
    #[must_use]
    pub fn into_history(self) -> Vec<Message> {
        self.history
    }

    /// Whether the exchange has finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    /// Tool rounds completed so far.
    #[must_use]
    pub fn tool_rounds(&self) -> u32 {
        self.tool_rounds
    }

    /// Whether the next request offers tools.
    #[must_use]
    pub fn tools_active(&self) -> bool {
        self.accumulator.tools_enabled()
    }

    /// Produce the next fragment, or `None` once the exchange is done.
    ///
    /// An error fragment is always followed by `None`.
    pub async fn next_fragment(&mut self) -> Option<ChatFragment> {
        loop {
            let fragment = match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Connecting => self.connect().await.err().map(ChatFragment::Error),
                Phase::Streaming(frames) => self.read(frames).await,
                Phase::Dispatching => self.dispatch().await,
                Phase::Done => return None,
            };

            if fragment.is_some() {
                return fragment;
            }
        }
    }

    fn build_request(&self) -> ChatCompletionRequest {
        let request = ChatCompletionRequest::streaming(&self.config, self.history.clone());
        if self.accumulator.tools_enabled() {
            request.with_tools(&self.dispatcher.definitions())
        } else {
            request
        }
    }

    async fn connect(&mut self) -> Result<(), ChatError> {
        let request = self.build_request();
        self.requests += 1;

        tracing::info!(
            exchange_id = %self.id,
            request = self.requests,
            messages = request.messages.len(),
            tools = request.has_tools(),
            "Opening completion stream"
        );

        match self.transport.open(&request).await {
            Ok(body) => {
                self.phase = Phase::Streaming(SseFrameStream::new(body));
                Ok(())
            }
            Err(e) => {
                tracing::error!(exchange_id = %self.id, error = %e, "Exchange failed before streaming");
                Err(e.into())
            }
        }
    }

    /// Read one frame. The phase is `Done` on entry and is only moved back
    /// to `Streaming` while the reader stays alive.
    async fn read(&mut self, mut frames: SseFrameStream<ByteStream>) -> Option<ChatFragment> {
        let next = frames.next().await;
        let event = match next {
            None => {
                self.release(frames, "eof");
                return self.accumulator.take_buffered_content().map(ChatFragment::Text);
            }
            Some(Err(e)) => {
                tracing::error!(exchange_id = %self.id, error = %e, "Stream read failed");
                self.release(frames, "read error");
                return Some(ChatFragment::Error(ChatError::Stream(e.to_string())));
            }
            Some(Ok(SseFrame::Event(event))) => event,
            Some(Ok(SseFrame::Done | SseFrame::Malformed { .. })) => {
                self.phase = Phase::Streaming(frames);
                return None;
            }
        };

        let ingested = self.accumulator.ingest(&event);
        match ingested.finish_reason {
            Some(ref reason) if !reason.is_terminal() => {
                tracing::debug!(
                    exchange_id = %self.id,
                    finish_reason = reason.as_str(),
                    "Ignoring unrecognised finish reason"
                );
                self.phase = Phase::Streaming(frames);
                ingested.text.map(ChatFragment::Text)
            }
            None => {
                self.phase = Phase::Streaming(frames);
                ingested.text.map(ChatFragment::Text)
            }
            Some(FinishReason::ToolCalls) if self.accumulator.tools_enabled() => {
                self.release(frames, "tool_calls");
                self.phase = Phase::Dispatching;
                ingested.text.map(ChatFragment::Text)
            }
            Some(reason) => {
                if reason == FinishReason::ToolCalls {
                    tracing::warn!(
                        exchange_id = %self.id,
                        "Model requested tools while tool calling is off; ending exchange"
                    );
                }
                self.release(frames, reason.as_str());
                ingested
                    .text
                    .or_else(|| self.accumulator.take_buffered_content())
                    .map(ChatFragment::Text)
            }
        }
    }

    fn release(&self, frames: SseFrameStream<ByteStream>, reason: &str) {
        drop(frames);
        tracing::debug!(exchange_id = %self.id, reason, "Released response reader");
    }

    async fn dispatch(&mut self) -> Option<ChatFragment> {
        let calls = self.accumulator.take_tool_calls();
        let buffered = self.accumulator.take_buffered_content();

        if calls.is_empty() {
            tracing::warn!(
                exchange_id = %self.id,
                "Finished for tool calls but none were complete; ending exchange"
            );
            return buffered.map(ChatFragment::Text);
        }

        tracing::info!(
            exchange_id = %self.id,
            round = self.tool_rounds + 1,
            tools = ?calls.iter().map(|c| c.name()).collect::<Vec<_>>(),
            "Dispatching tool calls"
        );

        self.history
            .push(Message::assistant_tool_calls(buffered, calls.clone()));
        let results = self.dispatcher.dispatch(&calls).await;
        self.history.extend(results.into_iter().map(Message::from));

        self.tool_rounds += 1;
        let tools_next =
            self.accumulator.tools_enabled() && self.tool_rounds < self.config.max_tool_rounds;
        self.accumulator.reset();
        self.accumulator.set_tools_enabled(tools_next);
        self.phase = Phase::Connecting;
        None
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("id", &self.id)
            .field("phase", &self.phase.name())
            .field("messages", &self.history.len())
            .field("tool_rounds", &self.tool_rounds)
            .field("tools_active", &self.accumulator.tools_enabled())
            .finish_non_exhaustive()
    }
}

type Step = BoxFuture<'static, (Exchange, Option<ChatFragment>)>;

/// [`Exchange`] as a `Stream` of fragments.
///
/// Dropping the stream drops the response reader.
pub struct ChatStream {
    exchange: Option<Exchange>,
    step: Option<Step>,
}

impl ChatStream {
    /// Wrap an exchange.
    #[must_use]
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange: Some(exchange),
            step: None,
        }
    }

    /// The exchange, unless a step is in flight.
    #[must_use]
    pub fn exchange(&self) -> Option<&Exchange> {
        self.exchange.as_ref()
    }

    /// Finish any in-flight step and return the working history.
    pub async fn into_history(mut self) -> Vec<Message> {
        if let Some(step) = self.step.take() {
            let (exchange, _) = step.await;
            return exchange.into_history();
        }
        self.exchange
            .map(Exchange::into_history)
            .unwrap_or_default()
    }
}

impl Stream for ChatStream {
    type Item = ChatFragment;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.step.is_none() {
            let Some(mut exchange) = this.exchange.take() else {
                return Poll::Ready(None);
            };
            this.step = Some(Box::pin(async move {
                let fragment = exchange.next_fragment().await;
                (exchange, fragment)
            }));
        }

        let Some(step) = this.step.as_mut() else {
            return Poll::Ready(None);
        };
        let (exchange, fragment) = ready!(step.as_mut().poll(cx));
        this.step = None;
        this.exchange = Some(exchange);
        Poll::Ready(fragment)
    }
}

impl fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatStream")
            .field("exchange", &self.exchange)
            .field("in_flight", &self.step.is_some())
            .finish()
    }
}
