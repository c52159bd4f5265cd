//! Chat configuration.
//!
//! [`ChatConfig`] is passed explicitly into the orchestrator; nothing reads
//! ambient global state after construction.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::{ChatError, Result};

/// Default completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Sampling temperature (0.0 to 2.0).
    pub temperature: f64,
    /// Top-p (nucleus) sampling (0.0 to 1.0).
    pub top_p: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
        }
    }
}

impl GenerationSettings {
    /// Set temperature.
    #[must_use]
    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    /// Set top-p.
    #[must_use]
    pub fn top_p(mut self, p: f64) -> Self {
        self.top_p = p;
        self
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a value is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::configuration(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ChatError::configuration(format!(
                "top_p must be between 0 and 1, got {}",
                self.top_p
            )));
        }
        Ok(())
    }
}

/// Everything one exchange needs to reach the completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Completions endpoint URL.
    pub endpoint: String,
    /// Bearer token for the endpoint.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Sampling parameters.
    #[serde(default)]
    pub settings: GenerationSettings,
    /// Whether tool calling is offered to the model.
    #[serde(default)]
    pub tools_enabled: bool,
    /// How many tool rounds an exchange may run before continuing without tools.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    /// API key for the search/extract service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,
    /// Transport-level request timeout.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_duration_serde"
    )]
    pub timeout: Option<Duration>,
}

fn default_max_tool_rounds() -> u32 {
    1
}

impl ChatConfig {
    /// Create a configuration for the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            settings: GenerationSettings::default(),
            tools_enabled: false,
            max_tool_rounds: default_max_tool_rounds(),
            search_api_key: None,
            timeout: None,
        }
    }

    /// Build a configuration from environment variables.
    ///
    /// Reads `CHATWIRE_ENDPOINT`, `OPENAI_API_KEY` (required),
    /// `CHATWIRE_MODEL`, `CHATWIRE_TEMPERATURE`, `CHATWIRE_TOP_P` and
    /// `TAVILY_API_KEY`. A search key turns tool calling on.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ChatConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ChatError::configuration("OPENAI_API_KEY is not set"))?;

        let mut config = Self::new(api_key);

        if let Some(endpoint) = lookup("CHATWIRE_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(model) = lookup("CHATWIRE_MODEL") {
            config.model = model;
        }
        if let Some(raw) = lookup("CHATWIRE_TEMPERATURE") {
            config.settings.temperature = parse_float("CHATWIRE_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = lookup("CHATWIRE_TOP_P") {
            config.settings.top_p = parse_float("CHATWIRE_TOP_P", &raw)?;
        }
        if let Some(key) = lookup("TAVILY_API_KEY").filter(|key| !key.trim().is_empty()) {
            config = config.with_search_api_key(key);
        }

        Ok(config)
    }

    /// Set the endpoint URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling parameters.
    #[must_use]
    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Enable or disable tool calling.
    #[must_use]
    pub fn with_tools(mut self, enabled: bool) -> Self {
        self.tools_enabled = enabled;
        self
    }

    /// Set the tool round cap.
    #[must_use]
    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Set the search service key and enable tool calling.
    #[must_use]
    pub fn with_search_api_key(mut self, key: impl Into<String>) -> Self {
        self.search_api_key = Some(key.into());
        self.tools_enabled = true;
        self
    }

    /// Set the transport timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparsable or non-HTTP endpoint,
    /// an empty key or model, or out-of-range sampling parameters.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            ChatError::configuration(format!("invalid endpoint '{}': {e}", self.endpoint))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChatError::configuration(format!(
                "endpoint must be http(s), got '{}'",
                url.scheme()
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(ChatError::configuration("api_key is empty"));
        }
        if self.model.trim().is_empty() {
            return Err(ChatError::configuration("model is empty"));
        }
        self.settings.validate()
    }
}

fn parse_float(name: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| ChatError::configuration(format!("{name} is not a number: '{raw}'")))
}

/// Serde helper for optional Duration.
mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs_f64().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<f64> = Option::deserialize(deserializer)?;
        Ok(opt.map(Duration::from_secs_f64))
    }
}
