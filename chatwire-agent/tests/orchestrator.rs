//! End-to-end behaviour of chat exchanges against scripted transports.

use chatwire_agent::{ChatFragment, ChatOrchestrator, Conversation};
use chatwire_core::{ChatConfig, ChatError, Message, Role, ToolCallRequest};
use chatwire_models::mock::{events, MockResponse, MockTransport};
use chatwire_models::{HttpTransport, ModelError};
use chatwire_tools::{
    FunctionTool, SchemaBuilder, ToolCallResult, ToolDefinition, ToolError, ToolRegistry,
};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(FunctionTool::new(
            ToolDefinition::new("search_tool", "Search the web")
                .with_parameters(SchemaBuilder::new().string("query", "Query", true).build()),
            |args: Value| async move {
                let result: ToolCallResult = match args["query"].as_str() {
                    Some(query) => Ok(json!({ "answer": format!("results for {query}") }).to_string()),
                    None => Err(ToolError::invalid_args("query is required")),
                };
                result
            },
        ))
        .register(FunctionTool::new(
            ToolDefinition::new("extract_tool", "Extract page content"),
            |_args: Value| async move {
                let result: ToolCallResult = Err(ToolError::execution_failed("site unreachable"));
                result
            },
        ));
    registry
}

fn orchestrator(config: ChatConfig, transport: &MockTransport) -> ChatOrchestrator {
    ChatOrchestrator::new(config, Arc::new(transport.clone()), registry())
}

fn with_tools() -> ChatConfig {
    ChatConfig::new("sk-test").with_tools(true)
}

fn without_tools() -> ChatConfig {
    ChatConfig::new("sk-test")
}

async fn collect(orchestrator: &ChatOrchestrator, history: &[Message]) -> Vec<ChatFragment> {
    orchestrator.stream(history).collect().await
}

fn texts(fragments: &[ChatFragment]) -> String {
    fragments.iter().filter_map(ChatFragment::as_text).collect()
}

fn search_call_events() -> Vec<Value> {
    vec![
        events::role(),
        events::content("Let me check."),
        events::tool_call(0, Some("call_1"), Some("sea"), None),
        events::tool_call(0, None, Some("rch_tool"), Some("{\"query\":")),
        events::tool_call(0, None, None, Some("\"rust\"}")),
        events::finish("tool_calls"),
    ]
}

#[tokio::test]
async fn streamed_text_concatenates_all_deltas() {
    let transport = MockTransport::new().with_response(MockResponse::events([
        events::role(),
        events::content("Hel"),
        events::content("lo, "),
        events::content("world"),
        events::finish("stop"),
    ]));

    let fragments = collect(&orchestrator(without_tools(), &transport), &[Message::user("hi")]).await;

    assert_eq!(
        fragments,
        vec![
            ChatFragment::Text("Hel".into()),
            ChatFragment::Text("lo, ".into()),
            ChatFragment::Text("world".into()),
        ]
    );
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn plain_answer_without_tools() {
    let transport = MockTransport::new().with_response(MockResponse::events([
        events::content("4"),
        events::finish("stop"),
    ]));

    let fragments = collect(&orchestrator(without_tools(), &transport), &[Message::user("2+2?")]).await;
    assert_eq!(fragments, vec![ChatFragment::Text("4".into())]);

    let request = &transport.requests()[0];
    assert!(request.stream);
    assert!(!request.has_tools());
    let body = serde_json::to_value(request).unwrap();
    assert!(body.get("tools").is_none());
    assert!(body.get("tool_choice").is_none());
}

#[tokio::test]
async fn malformed_lines_do_not_change_output() {
    let clean = MockTransport::new().with_response(MockResponse::events([
        events::content("a"),
        events::content("b"),
        events::finish("stop"),
    ]));
    let noisy = MockTransport::new().with_response(MockResponse::raw([
        format!("data: {}\n\n", events::content("a")),
        "data: {not json\n\n: keep-alive\n\nevent: ping\n".to_string(),
        format!("data: {}\n\n", events::content("b")),
        format!("data: {}\n\ndata: [DONE]\n\n", events::finish("stop")),
    ]));

    let history = [Message::user("hi")];
    assert_eq!(
        collect(&orchestrator(without_tools(), &clean), &history).await,
        collect(&orchestrator(without_tools(), &noisy), &history).await
    );
}

#[tokio::test]
async fn events_split_across_chunks_are_reassembled() {
    let line = format!("data: {}\n\n", events::content("héllo"));
    let (head, tail) = line.as_bytes().split_at(12);
    let transport = MockTransport::new().with_response(MockResponse::Stream(vec![
        Ok(bytes::Bytes::copy_from_slice(head)),
        Ok(bytes::Bytes::copy_from_slice(tail)),
        Ok(bytes::Bytes::from(format!("data: {}\n\n", events::finish("stop")))),
    ]));

    let fragments = collect(&orchestrator(without_tools(), &transport), &[Message::user("hi")]).await;
    assert_eq!(texts(&fragments), "héllo");
}

#[tokio::test]
async fn tool_round_continues_without_tools() {
    let transport = MockTransport::new()
        .with_response(MockResponse::events(search_call_events()))
        .with_response(MockResponse::events([
            events::content("Rust 1.80 "),
            events::content("is out."),
            events::finish("stop"),
        ]));

    let orchestrator = orchestrator(with_tools(), &transport);
    let stream = orchestrator.stream(&[Message::user("latest rust?")]);
    let fragments: Vec<_> = stream.collect().await;

    // The buffered preamble is never shown.
    assert_eq!(texts(&fragments), "Rust 1.80 is out.");
    assert!(fragments.iter().all(|f| !f.is_error()));

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);

    let first = &requests[0];
    assert!(first.has_tools());
    assert_eq!(first.tool_choice.as_deref(), Some("auto"));
    let names: Vec<_> = first
        .tools
        .iter()
        .flatten()
        .map(|t| t.function.name.as_str())
        .collect();
    assert_eq!(names, vec!["search_tool", "extract_tool"]);

    let second = &requests[1];
    assert!(!second.has_tools());
    assert_eq!(second.messages.len(), 3);

    let assistant = &second.messages[1];
    assert_eq!(assistant.role, Role::Assistant);
    assert_eq!(assistant.text().as_deref(), Some("Let me check."));
    assert_eq!(
        assistant.tool_calls,
        Some(vec![ToolCallRequest::new("call_1", "search_tool", "{\"query\":\"rust\"}")])
    );

    let tool = &second.messages[2];
    assert_eq!(tool.role, Role::Tool);
    assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool.name.as_deref(), Some("search_tool"));
    assert_eq!(
        serde_json::from_str::<Value>(&tool.text().unwrap()).unwrap(),
        json!({"answer": "results for rust"})
    );
}

#[tokio::test]
async fn assistant_tool_call_message_has_null_content_without_preamble() {
    let transport = MockTransport::new()
        .with_response(MockResponse::events([
            events::full_tool_call(0, "call_1", "search_tool", "{\"query\":\"x\"}"),
            events::finish("tool_calls"),
        ]))
        .with_response(MockResponse::events([events::content("done"), events::finish("stop")]));

    collect(&orchestrator(with_tools(), &transport), &[Message::user("q")]).await;

    let body = serde_json::to_value(&transport.requests()[1]).unwrap();
    assert_eq!(body["messages"][1]["role"], "assistant");
    assert_eq!(body["messages"][1]["content"], Value::Null);
    assert_eq!(body["messages"][1]["tool_calls"][0]["type"], "function");
    assert_eq!(body["messages"][2]["role"], "tool");
}

#[tokio::test]
async fn every_call_gets_exactly_one_result_in_order() {
    let transport = MockTransport::new()
        .with_response(MockResponse::events([
            events::full_tool_call(0, "call_a", "search_tool", "{\"query\":\"a\"}"),
            events::full_tool_call(1, "call_b", "extract_tool", "{\"urls\":[\"https://x.test\"]}"),
            events::finish("tool_calls"),
        ]))
        .with_response(MockResponse::events([events::content("ok"), events::finish("stop")]));

    let mut stream = orchestrator(with_tools(), &transport).stream(&[Message::user("q")]);
    while stream.next().await.is_some() {}
    let history = stream.into_history().await;

    let tool_messages: Vec<_> = history.iter().filter(|m| m.role == Role::Tool).collect();
    assert_eq!(tool_messages.len(), 2);
    assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("call_a"));
    assert_eq!(tool_messages[1].tool_call_id.as_deref(), Some("call_b"));
    assert_eq!(
        serde_json::from_str::<Value>(&tool_messages[1].text().unwrap()).unwrap(),
        json!({"error": "工具 extract_tool 执行失败: site unreachable"})
    );
    // The working history ends at the tool results; the final answer is streamed only.
    assert_eq!(history.len(), 4);
}

#[tokio::test]
async fn unknown_tool_and_bad_arguments_become_error_results() {
    let transport = MockTransport::new()
        .with_response(MockResponse::events([
            events::full_tool_call(0, "call_w", "weather", "{}"),
            events::full_tool_call(1, "call_s", "search_tool", "{\"query\":"),
            events::finish("tool_calls"),
        ]))
        .with_response(MockResponse::events([events::content("sorry"), events::finish("stop")]));

    let fragments = collect(&orchestrator(with_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(fragments, vec![ChatFragment::Text("sorry".into())]);

    let messages = &transport.requests()[1].messages;
    let unknown: Value = serde_json::from_str(&messages[2].text().unwrap()).unwrap();
    assert_eq!(unknown, json!({"error": "未知工具: weather"}));

    let bad_args: Value = serde_json::from_str(&messages[3].text().unwrap()).unwrap();
    assert!(bad_args["error"]
        .as_str()
        .unwrap()
        .starts_with("参数解析错误: "));
}

#[tokio::test]
async fn buffered_text_flushes_once_on_stop() {
    let transport = MockTransport::new().with_response(MockResponse::events([
        events::content("No tools "),
        events::content("needed."),
        events::finish("stop"),
    ]));

    let fragments = collect(&orchestrator(with_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(fragments, vec![ChatFragment::Text("No tools needed.".into())]);
}

#[tokio::test]
async fn buffered_text_flushes_on_eof_without_finish() {
    let transport = MockTransport::new().with_response(MockResponse::events_without_done([
        events::content("partial "),
        events::content("answer"),
    ]));

    let fragments = collect(&orchestrator(with_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(fragments, vec![ChatFragment::Text("partial answer".into())]);
}

#[tokio::test]
async fn length_finish_is_terminal() {
    let transport = MockTransport::new().with_response(MockResponse::events([
        events::content("trunc"),
        events::finish("length"),
        events::content("never shown"),
    ]));

    let fragments = collect(&orchestrator(without_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(texts(&fragments), "trunc");
}

#[tokio::test]
async fn empty_finish_reason_keeps_streaming() {
    let transport = MockTransport::new().with_response(MockResponse::events([
        json!({"choices": [{"index": 0, "delta": {"content": "Hel"}, "finish_reason": ""}]}),
        json!({"choices": [{"index": 0, "delta": {"content": "lo"}, "finish_reason": ""}]}),
        events::finish("stop"),
    ]));

    let fragments = collect(&orchestrator(without_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(texts(&fragments), "Hello");
}

#[tokio::test]
async fn unrecognised_finish_reason_is_not_terminal() {
    let transport = MockTransport::new().with_response(MockResponse::events([
        events::content("Let me "),
        events::finish("function_call"),
        events::content("answer."),
        events::finish("stop"),
    ]));

    let fragments = collect(&orchestrator(with_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(fragments, vec![ChatFragment::Text("Let me answer.".into())]);
}

#[tokio::test]
async fn stop_with_content_flushes_buffer_once() {
    let transport = MockTransport::new().with_response(MockResponse::events([
        events::content("A"),
        json!({"choices": [{"index": 0, "delta": {"content": "B"}, "finish_reason": "stop"}]}),
    ]));

    let fragments = collect(&orchestrator(with_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(fragments, vec![ChatFragment::Text("AB".into())]);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn transport_failure_yields_single_error() {
    let transport = MockTransport::new()
        .with_response(MockResponse::fail(ModelError::http(500, "upstream exploded")));

    let fragments = collect(&orchestrator(without_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(
        fragments,
        vec![ChatFragment::Error(ChatError::HttpStatus {
            status: 500,
            body: "upstream exploded".into(),
        })]
    );
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn mid_stream_failure_ends_with_error() {
    let transport = MockTransport::new().with_response(
        MockResponse::events_without_done([events::content("par")]).then_error("connection reset"),
    );

    let fragments = collect(&orchestrator(without_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0], ChatFragment::Text("par".into()));
    assert!(matches!(&fragments[1], ChatFragment::Error(ChatError::Stream(msg)) if msg.contains("connection reset")));

    let wire: Value = serde_json::from_str(&fragments[1].to_wire()).unwrap();
    assert!(wire["error"].is_string());
}

#[tokio::test]
async fn continuation_failure_is_reported() {
    let transport = MockTransport::new()
        .with_response(MockResponse::events(search_call_events()))
        .with_response(MockResponse::fail(ModelError::Connection("refused".into())));

    let fragments = collect(&orchestrator(with_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(
        fragments,
        vec![ChatFragment::Error(ChatError::Transport("refused".into()))]
    );
}

#[tokio::test]
async fn tool_calls_after_round_cap_end_the_exchange() {
    let transport = MockTransport::new()
        .with_response(MockResponse::events(search_call_events()))
        .with_response(MockResponse::events([
            events::full_tool_call(0, "call_2", "search_tool", "{\"query\":\"again\"}"),
            events::finish("tool_calls"),
        ]));

    let fragments = collect(&orchestrator(with_tools(), &transport), &[Message::user("q")]).await;
    assert!(fragments.is_empty());
    assert_eq!(transport.request_count(), 2);
    assert_eq!(transport.remaining(), 0);
}

#[tokio::test]
async fn round_cap_allows_configured_rounds() {
    let transport = MockTransport::new()
        .with_response(MockResponse::events(search_call_events()))
        .with_response(MockResponse::events([
            events::full_tool_call(0, "call_2", "search_tool", "{\"query\":\"more\"}"),
            events::finish("tool_calls"),
        ]))
        .with_response(MockResponse::events([events::content("final"), events::finish("stop")]));

    let config = with_tools().with_max_tool_rounds(2);
    let fragments = collect(&orchestrator(config, &transport), &[Message::user("q")]).await;
    assert_eq!(fragments, vec![ChatFragment::Text("final".into())]);

    let offered: Vec<bool> = transport.requests().iter().map(|r| r.has_tools()).collect();
    assert_eq!(offered, vec![true, true, false]);
    assert_eq!(transport.requests()[2].messages.len(), 5);
}

#[tokio::test]
async fn tool_calls_finish_without_complete_calls_acts_as_stop() {
    let transport = MockTransport::new().with_response(MockResponse::events([
        events::content("Answer anyway."),
        events::tool_call(0, None, Some("search_tool"), Some("{}")),
        events::finish("tool_calls"),
    ]));

    let fragments = collect(&orchestrator(with_tools(), &transport), &[Message::user("q")]).await;
    assert_eq!(fragments, vec![ChatFragment::Text("Answer anyway.".into())]);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn tools_not_offered_when_registry_is_empty() {
    let transport = MockTransport::new().with_response(MockResponse::events([
        events::content("hi"),
        events::finish("stop"),
    ]));
    let orchestrator =
        ChatOrchestrator::new(with_tools(), Arc::new(transport.clone()), ToolRegistry::new());

    let fragments = collect(&orchestrator, &[Message::user("q")]).await;
    assert_eq!(fragments, vec![ChatFragment::Text("hi".into())]);
    assert!(!transport.requests()[0].has_tools());
}

#[tokio::test]
async fn caller_history_is_not_mutated() {
    let transport = MockTransport::new()
        .with_response(MockResponse::events(search_call_events()))
        .with_response(MockResponse::events([events::content("x"), events::finish("stop")]));
    let history = vec![Message::system("Be brief."), Message::user("q")];

    let mut exchange = orchestrator(with_tools(), &transport).exchange(&history);
    while exchange.next_fragment().await.is_some() {}

    assert!(exchange.is_done());
    assert_eq!(exchange.tool_rounds(), 1);
    assert_eq!(exchange.history().len(), 4);
    assert_eq!(history.len(), 2);
    assert!(exchange.next_fragment().await.is_none());
}

#[tokio::test]
async fn complete_appends_answer() {
    let transport = MockTransport::new()
        .with_response(MockResponse::events(search_call_events()))
        .with_response(MockResponse::events([events::content("It is 1.80."), events::finish("stop")]));

    let mut conversation = Conversation::new().with_system_prompt("Be brief.");
    conversation.push_user("latest rust?");

    let answer = orchestrator(with_tools(), &transport)
        .complete(&mut conversation)
        .await
        .unwrap();

    assert_eq!(answer, "It is 1.80.");
    assert_eq!(conversation.len(), 3);
    assert_eq!(conversation.last(), Some(&Message::assistant("It is 1.80.")));
}

#[tokio::test]
async fn complete_leaves_conversation_on_error() {
    let transport = MockTransport::new().with_response(MockResponse::fail(ModelError::EmptyBody));

    let mut conversation = Conversation::new();
    conversation.push_user("q");
    let before = conversation.clone();

    let result = orchestrator(without_tools(), &transport)
        .complete(&mut conversation)
        .await;
    assert_eq!(result, Err(ChatError::EmptyBody));
    assert_eq!(conversation, before);
}

#[tokio::test]
async fn http_transport_end_to_end() {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    let body = format!(
        "data: {}\n\ndata: {}\n\ndata: {}\n\ndata: [DONE]\n\n",
        events::content("Hello"),
        events::content(" there"),
        events::finish("stop"),
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "stream": true,
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = without_tools().with_endpoint(format!("{}/v1/chat/completions", server.uri()));
    let orchestrator = ChatOrchestrator::new(
        config.clone(),
        Arc::new(HttpTransport::from_config(&config)),
        ToolRegistry::new(),
    );

    let fragments = collect(&orchestrator, &[Message::user("hi")]).await;
    assert_eq!(texts(&fragments), "Hello there");
}

#[tokio::test]
async fn http_error_status_end_to_end() {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let config = without_tools().with_endpoint(server.uri());
    let orchestrator = ChatOrchestrator::new(
        config.clone(),
        Arc::new(HttpTransport::from_config(&config)),
        ToolRegistry::new(),
    );

    let fragments = collect(&orchestrator, &[Message::user("hi")]).await;
    assert_eq!(
        fragments,
        vec![ChatFragment::Error(ChatError::HttpStatus {
            status: 429,
            body: "rate limited".into(),
        })]
    );
}

#[test]
fn from_config_rejects_invalid_configuration() {
    let config = ChatConfig::new("sk-test").with_endpoint("not a url");
    assert!(matches!(
        ChatOrchestrator::from_config(config),
        Err(ChatError::Configuration(_))
    ));
}

#[cfg(feature = "web-search")]
#[test]
fn from_config_registers_web_search_tools() {
    let config = ChatConfig::new("sk-test").with_search_api_key("tvly-test");
    let orchestrator = ChatOrchestrator::from_config(config).unwrap();
    assert_eq!(orchestrator.registry().names(), vec!["search_tool", "extract_tool"]);
    assert!(orchestrator.config().tools_enabled);
}
