//! HTTP inference client for OpenAI-compatible endpoints

use super::error::{GenerationError, truncate_body};
use super::retry::execute_with_retry;
use super::{GenerationOutcome, InferenceBackend};
use crate::config::{ApiStyle, ModelEndpoint};
use crate::error::GaugeResult;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::instrument;

/// Sends one prompt per request to the configured endpoint, retrying
/// transient failures.
///
/// Cheap to share behind an `Arc`: the underlying connection pool is reused
/// by every worker.
pub struct HttpInferenceClient {
    endpoint: ModelEndpoint,
    http_client: Client,
    url: String,
}

impl HttpInferenceClient {
    /// Create a client; the per-attempt timeout is baked into the HTTP client
    pub fn new(endpoint: ModelEndpoint) -> GaugeResult<Self> {
        let http_client = Client::builder()
            .timeout(endpoint.request_timeout())
            .build()?;
        let url = endpoint.endpoint_url();
        Ok(Self {
            endpoint,
            http_client,
            url,
        })
    }

    /// Endpoint this client talks to
    pub fn endpoint(&self) -> &ModelEndpoint {
        &self.endpoint
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut body = match self.endpoint.api_style {
            ApiStyle::Completions => json!({
                "model": self.endpoint.name,
                "prompt": prompt,
            }),
            ApiStyle::Chat => json!({
                "model": self.endpoint.name,
                "messages": [{"role": "user", "content": prompt}],
            }),
        };
        body["temperature"] = json!(self.endpoint.temperature);
        body["max_tokens"] = json!(self.endpoint.max_output_tokens);
        body["top_p"] = json!(self.endpoint.top_p);
        body
    }

    /// A single attempt with no retry
    async fn attempt(&self, body: &Value) -> Result<String, GenerationError> {
        let mut request = self.http_client.post(&self.url).json(body);
        if let Some(api_key) = &self.endpoint.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(GenerationError::from_status(status.as_u16(), &text));
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| {
            GenerationError::MalformedResponse(format!(
                "invalid JSON ({}): {}",
                e,
                truncate_body(&text)
            ))
        })?;

        extract_text(&json, self.endpoint.api_style)
    }

    fn transport_error(&self, error: reqwest::Error) -> GenerationError {
        if error.is_timeout() {
            GenerationError::Timeout(self.endpoint.request_timeout_secs)
        } else {
            GenerationError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl InferenceBackend for HttpInferenceClient {
    #[instrument(skip(self, prompt), fields(model = %self.endpoint.name), level = "debug")]
    async fn generate(&self, prompt: &str) -> GenerationOutcome {
        let body = self.request_body(prompt);
        execute_with_retry(&self.endpoint.retry, |_| self.attempt(&body)).await
    }

    fn model_name(&self) -> &str {
        &self.endpoint.name
    }
}

/// Pull the generated text out of a response body
pub fn extract_text(json: &Value, style: ApiStyle) -> Result<String, GenerationError> {
    let choice = json
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| GenerationError::MalformedResponse("response has no choices".into()))?;

    let text = match style {
        ApiStyle::Completions => choice.get("text"),
        ApiStyle::Chat => choice.get("message").and_then(|m| m.get("content")),
    };

    match text {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | Some(Value::Null) => Err(GenerationError::EmptyResponse),
        Some(other) => Err(GenerationError::MalformedResponse(format!(
            "expected string content, got {}",
            other
        ))),
        None => Err(GenerationError::MalformedResponse(
            "choice has no text field".into(),
        )),
    }
}
