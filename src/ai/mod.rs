pub mod gemini;
pub mod parser;
pub mod pipeline;
pub mod prompts;

use std::fmt;

use async_trait::async_trait;

pub use gemini::GeminiClient;
pub use parser::{EvaluationResult, ParseError};
pub use pipeline::{EvaluationPipeline, PipelineError};

/// Errors surfaced by a text-generation provider
#[derive(Debug)]
pub enum LlmError {
    /// Provider signalled a rate or billing limit
    QuotaExceeded(String),

    /// Provider's content-safety classifier withheld the response
    SafetyBlocked,

    /// Provider returned no candidates or no content parts
    EmptyResponse,

    /// Any other provider or transport failure
    Provider(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::QuotaExceeded(detail) => write!(
                f,
                "API quota exceeded, check billing or wait for quota reset: {}",
                detail
            ),
            LlmError::SafetyBlocked => write!(f, "response blocked by safety filters"),
            LlmError::EmptyResponse => write!(f, "no content in provider response"),
            LlmError::Provider(detail) => write!(f, "provider error: {}", detail),
        }
    }
}

impl std::error::Error for LlmError {}

/// Contract for the generative-text provider used by the pipeline
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a single prompt and return the raw text response
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
