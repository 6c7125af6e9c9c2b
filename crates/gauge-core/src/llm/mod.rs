//! Model inference
//!
//! [`InferenceBackend`] is the seam the benchmark runner talks to;
//! [`HttpInferenceClient`] is the production implementation.

mod client;
mod error;
mod retry;

pub use client::{HttpInferenceClient, extract_text};
pub use error::{GenerationError, truncate_body};
pub use retry::execute_with_retry;

use async_trait::async_trait;

/// Text produced for one prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Attempts made, including the successful one
    pub attempts: u32,
}

/// Result of generating for one prompt
pub type GenerationOutcome = Result<Generation, GenerationError>;

/// Something that turns a prompt into model output
///
/// Implementations must be safe to call from many workers at once.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Generate a completion, retrying transient failures internally
    async fn generate(&self, prompt: &str) -> GenerationOutcome;

    /// Model name recorded alongside predictions
    fn model_name(&self) -> &str;
}
