//! Model endpoint configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Request shape sent to an OpenAI-compatible endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    /// `POST {base_url}/completions` with a raw `prompt`
    #[default]
    Completions,
    /// `POST {base_url}/chat/completions` with a single user message
    Chat,
}

impl ApiStyle {
    /// Path appended to the endpoint base URL
    pub fn path(&self) -> &'static str {
        match self {
            ApiStyle::Completions => "completions",
            ApiStyle::Chat => "chat/completions",
        }
    }
}

/// Retry policy for model requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per prompt, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on a single backoff delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given failed attempt (0-based), before jitter.
    ///
    /// Doubles from `base_delay_ms` and saturates at `max_delay_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt);
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// The model under evaluation and how to reach it
///
/// Immutable for the lifetime of a run.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelEndpoint {
    /// Model name sent in requests and recorded in reports
    pub name: String,

    /// Base URL of the OpenAI-compatible API, e.g. `http://localhost:8000/v1`
    #[serde(alias = "api_url")]
    pub base_url: String,

    /// Bearer credential
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Request shape
    #[serde(default)]
    pub api_style: ApiStyle,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens", alias = "max_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Per-attempt request timeout in seconds
    #[serde(default = "default_request_timeout_secs", alias = "timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_max_output_tokens() -> u32 {
    4096
}

fn default_top_p() -> f32 {
    1.0
}

fn default_request_timeout_secs() -> u64 {
    180
}

impl ModelEndpoint {
    /// Create an endpoint with default sampling parameters
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: None,
            api_style: ApiStyle::default(),
            temperature: 0.0,
            max_output_tokens: default_max_output_tokens(),
            top_p: default_top_p(),
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the bearer credential
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request shape
    pub fn with_api_style(mut self, style: ApiStyle) -> Self {
        self.api_style = style;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the per-attempt timeout
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Per-attempt request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL for generation requests
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_style.path()
        )
    }
}

impl fmt::Debug for ModelEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEndpoint")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_style", &self.api_style)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("top_p", &self.top_p)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_trims_trailing_slash() {
        let endpoint = ModelEndpoint::new("m", "http://localhost:8000/v1/");
        assert_eq!(endpoint.endpoint_url(), "http://localhost:8000/v1/completions");

        let chat = endpoint.with_api_style(ApiStyle::Chat);
        assert_eq!(chat.endpoint_url(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 350,
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(350));
        assert_eq!(policy.backoff(40), Duration::from_millis(350));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let endpoint = ModelEndpoint::new("m", "http://x").with_api_key("sk-secret");
        let debug = format!("{:?}", endpoint);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_deserialize_with_aliases() {
        let endpoint: ModelEndpoint = serde_json::from_str(
            r#"{"name": "qwen", "api_url": "http://h/v1", "max_tokens": 512, "timeout": 30}"#,
        )
        .unwrap();
        assert_eq!(endpoint.base_url, "http://h/v1");
        assert_eq!(endpoint.max_output_tokens, 512);
        assert_eq!(endpoint.request_timeout_secs, 30);
        assert_eq!(endpoint.top_p, 1.0);
        assert_eq!(endpoint.retry.max_attempts, 3);
    }
}
