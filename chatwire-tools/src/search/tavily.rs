//! Tavily search and extract client.
//!
//! Requires a Tavily API key, either passed directly or read from the
//! `TAVILY_API_KEY` environment variable. Both endpoints return JSON that is
//! handed back to the model as-is.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::env;
use std::time::Duration;

use crate::ToolError;

/// Default Tavily API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Search depth for Tavily queries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Basic search (faster, less comprehensive).
    #[default]
    Basic,
    /// Advanced search (slower, more comprehensive).
    Advanced,
}

/// Extraction strategy for page content.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    /// Main article text.
    Article,
    /// Code blocks.
    Code,
    /// Let the service decide.
    #[default]
    Auto,
}

/// Options accepted by `search_tool`, in the model-facing camelCase shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Ask the service for a generated answer.
    pub include_answer: bool,
    /// Maximum number of results (1 to 20).
    pub max_results: u32,
    /// Search depth.
    pub search_depth: SearchDepth,
    /// Include raw page content.
    pub include_raw_content: bool,
    /// Include image results.
    pub include_images: bool,
    /// Restrict results to these domains.
    pub include_domains: Vec<String>,
    /// Drop results from these domains.
    pub exclude_domains: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_answer: true,
            max_results: 5,
            search_depth: SearchDepth::Basic,
            include_raw_content: false,
            include_images: false,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        }
    }
}

/// Options accepted by `extract_tool`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractOptions {
    /// Include raw page content.
    pub include_raw_content: bool,
    /// Extraction strategy.
    pub extract_mode: ExtractMode,
}

/// Configuration for the Tavily client.
#[derive(Debug, Clone)]
pub struct TavilyConfig {
    /// API key for Tavily.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl TavilyConfig {
    /// Create a new configuration with an API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Tavily API error response.
#[derive(Debug, Deserialize)]
struct TavilyErrorResponse {
    detail: Option<JsonValue>,
    message: Option<String>,
}

impl TavilyErrorResponse {
    fn into_message(self) -> Option<String> {
        let detail = self.detail.map(|detail| match detail {
            JsonValue::String(text) => text,
            JsonValue::Object(ref map) => map
                .get("error")
                .and_then(JsonValue::as_str)
                .map_or_else(|| detail.to_string(), str::to_string),
            other => other.to_string(),
        });
        detail.or(self.message)
    }
}

/// HTTP client for the Tavily search and extract endpoints.
#[derive(Debug, Clone)]
pub struct TavilyClient {
    config: TavilyConfig,
    client: Client,
}

impl TavilyClient {
    /// Create a new client with an API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(TavilyConfig::new(api_key))
    }

    /// Create a new client from the `TAVILY_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set.
    pub fn from_env() -> Result<Self, ToolError> {
        let api_key = env::var("TAVILY_API_KEY").map_err(|_| {
            ToolError::execution_failed(
                "TAVILY_API_KEY environment variable not set. \
                 Get an API key at https://tavily.com",
            )
        })?;
        Ok(Self::new(api_key))
    }

    /// Create a new client with custom configuration.
    #[must_use]
    pub fn with_config(config: TavilyConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &TavilyConfig {
        &self.config
    }

    /// Run a web search.
    ///
    /// # Errors
    ///
    /// Returns a tool error if the request fails, the service rejects it, or
    /// the response is not JSON.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<JsonValue, ToolError> {
        let mut body = serde_json::json!({
            "api_key": self.config.api_key,
            "query": query,
            "search_depth": options.search_depth,
            "include_answer": options.include_answer,
            "include_raw_content": options.include_raw_content,
            "include_images": options.include_images,
            "max_results": options.max_results.clamp(1, 20),
        });

        if !options.include_domains.is_empty() {
            body["include_domains"] = JsonValue::from(options.include_domains.clone());
        }
        if !options.exclude_domains.is_empty() {
            body["exclude_domains"] = JsonValue::from(options.exclude_domains.clone());
        }

        self.post("search", &body).await
    }

    /// Extract content from web pages.
    ///
    /// # Errors
    ///
    /// Same as [`TavilyClient::search`].
    pub async fn extract(&self, urls: &[String], options: &ExtractOptions) -> Result<JsonValue, ToolError> {
        let body = serde_json::json!({
            "api_key": self.config.api_key,
            "urls": urls,
            "include_raw_content": options.include_raw_content,
            "extract_mode": options.extract_mode,
        });

        self.post("extract", &body).await
    }

    async fn post(&self, path: &str, body: &JsonValue) -> Result<JsonValue, ToolError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        tracing::debug!(url = %url, "Calling Tavily");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TavilyErrorResponse>(&text)
                .ok()
                .and_then(TavilyErrorResponse::into_message)
                .unwrap_or_else(|| format!("Tavily API returned status: {status}"));
            tracing::warn!(status = %status, error = %message, "Tavily request failed");
            return Err(ToolError::execution_failed(message));
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Failed to parse response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> TavilyClient {
        TavilyClient::with_config(TavilyConfig::new("tvly-test").with_base_url(server.uri()))
    }

    #[test]
    fn test_config_new() {
        let config = TavilyConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_search_options_camel_case() {
        let options: SearchOptions = serde_json::from_value(json!({
            "maxResults": 3,
            "searchDepth": "advanced",
            "includeDomains": ["rust-lang.org"]
        }))
        .unwrap();
        assert_eq!(options.max_results, 3);
        assert_eq!(options.search_depth, SearchDepth::Advanced);
        assert_eq!(options.include_domains, vec!["rust-lang.org".to_string()]);
        assert!(options.include_answer);
    }

    #[test]
    fn test_extract_options_default() {
        let options: ExtractOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options.extract_mode, ExtractMode::Auto);
        assert!(!options.include_raw_content);
    }

    #[tokio::test]
    async fn test_search_sends_snake_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(json!({
                "api_key": "tvly-test",
                "query": "rust async",
                "search_depth": "advanced",
                "max_results": 20,
                "exclude_domains": ["example.com"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "rust async",
                "answer": "Use tokio.",
                "results": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = SearchOptions {
            search_depth: SearchDepth::Advanced,
            max_results: 50,
            exclude_domains: vec!["example.com".into()],
            ..SearchOptions::default()
        };
        let result = client_for(&server).await.search("rust async", &options).await.unwrap();
        assert_eq!(result["answer"], "Use tokio.");
    }

    #[tokio::test]
    async fn test_extract_posts_urls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract"))
            .and(body_partial_json(json!({
                "urls": ["https://example.com/a"],
                "extract_mode": "code"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"url": "https://example.com/a", "raw_content": "fn main() {}"}],
                "failed_results": []
            })))
            .mount(&server)
            .await;

        let options = ExtractOptions {
            extract_mode: ExtractMode::Code,
            ..ExtractOptions::default()
        };
        let result = client_for(&server)
            .await
            .extract(&["https://example.com/a".to_string()], &options)
            .await
            .unwrap();
        assert_eq!(result["results"][0]["raw_content"], "fn main() {}");
    }

    #[tokio::test]
    async fn test_error_detail_becomes_tool_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": {"error": "Unauthorized: missing or invalid API key."}})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .search("x", &SearchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Unauthorized: missing or invalid API key.");
    }

    #[tokio::test]
    async fn test_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .search("x", &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(err.message().contains("502"));
    }
}
