//! Failure taxonomy for a single generation attempt

use thiserror::Error;

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Why a generation attempt failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Connection refused, reset, DNS failure and the like
    #[error("network error: {0}")]
    Network(String),

    /// The per-attempt timeout elapsed
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The endpoint answered but produced no text
    #[error("model returned an empty response")]
    EmptyResponse,

    /// 5xx from the endpoint
    #[error("server error (status {status}): {body}")]
    Server { status: u16, body: String },

    /// 429 from the endpoint
    #[error("rate limited (status 429): {body}")]
    RateLimited { body: String },

    /// Any other non-success status, including authentication failures
    #[error("request rejected (status {status}): {body}")]
    Client { status: u16, body: String },

    /// The body was not the expected JSON shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl GenerationError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Network(_)
                | GenerationError::Timeout(_)
                | GenerationError::Server { .. }
                | GenerationError::RateLimited { .. }
        )
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = truncate_body(body);
        match status {
            429 => GenerationError::RateLimited { body },
            500..=599 => GenerationError::Server { status, body },
            _ => GenerationError::Client { status, body },
        }
    }
}

/// Trim an error body to a bounded length on a char boundary
pub fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push_str("...[truncated]");
    out
}
