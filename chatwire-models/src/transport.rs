//! Completion transports.
//!
//! A [`CompletionTransport`] sends one streaming request and hands back the
//! raw response body as a byte stream. It never retries; every failure is
//! returned once.

use async_trait::async_trait;
use bytes::Bytes;
use chatwire_core::ChatConfig;
use futures::{Stream, StreamExt};
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;

use crate::error::{ModelError, ModelResult};
use crate::types::ChatCompletionRequest;

/// Raw response body of a streaming completion.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ModelError>> + Send>>;

/// Opens streaming completion requests.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Send the request and return the response body once headers arrive.
    ///
    /// # Errors
    ///
    /// Connect failures, non-2xx statuses and missing bodies are reported
    /// here, before any byte of the body is read.
    async fn open(&self, request: &ChatCompletionRequest) -> ModelResult<ByteStream>;
}

/// `reqwest`-backed transport for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Create a transport for an endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: None,
        }
    }

    /// Create a transport from a chat configuration.
    pub fn from_config(config: &ChatConfig) -> Self {
        let transport = Self::new(&config.endpoint, &config.api_key);
        match config.timeout {
            Some(timeout) => transport.with_timeout(timeout),
            None => transport,
        }
    }

    /// Set a whole-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a preconfigured HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Get the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn open(&self, request: &ChatCompletionRequest) -> ModelResult<ByteStream> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(request);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(endpoint = %self.endpoint, error = %e, "Completion request failed");
            ModelError::Connection(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Completion endpoint returned error");
            return Err(ModelError::http(status.as_u16(), body));
        }

        if response.content_length() == Some(0) {
            return Err(ModelError::EmptyBody);
        }

        tracing::debug!(status = status.as_u16(), "Completion stream opened");
        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(ModelError::from)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatwire_core::Message;
    use futures::TryStreamExt;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest::streaming(&ChatConfig::new("sk-test"), vec![Message::user("2+2?")])
    }

    #[test]
    fn test_from_config() {
        let config = ChatConfig::new("k")
            .with_endpoint("http://localhost:9/v1/chat/completions")
            .with_timeout(Duration::from_secs(5));
        let transport = HttpTransport::from_config(&config);
        assert_eq!(transport.endpoint(), "http://localhost:9/v1/chat/completions");
        assert_eq!(transport.timeout, Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_open_streams_body() {
        let server = MockServer::start().await;
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"4\"}}]}\n\ndata: [DONE]\n\n";
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"stream": true, "model": "gpt-4o-mini"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport =
            HttpTransport::new(format!("{}/v1/chat/completions", server.uri()), "sk-test");
        let chunks: Vec<Bytes> = transport
            .open(&request())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let text: Vec<u8> = chunks.concat();
        assert_eq!(String::from_utf8(text).unwrap(), body);
    }

    #[tokio::test]
    async fn test_non_success_status_captures_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"bad key\"}"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), "sk-wrong");
        match transport.open(&request()).await {
            Err(ModelError::Http { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            Err(other) => panic!("expected HTTP error, got {other:?}"),
            Ok(_) => panic!("expected HTTP error, got a stream"),
        }
    }

    #[tokio::test]
    async fn test_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), "sk-test");
        assert!(matches!(
            transport.open(&request()).await,
            Err(ModelError::EmptyBody)
        ));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let transport = HttpTransport::new("http://127.0.0.1:1/v1/chat/completions", "sk-test");
        assert!(matches!(
            transport.open(&request()).await,
            Err(ModelError::Connection(_))
        ));
    }
}
