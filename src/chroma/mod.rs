pub mod client;
pub mod seed;

use std::fmt;

use async_trait::async_trait;

pub use client::ChromaClient;

/// Errors raised by the vector-context store
#[derive(Debug)]
pub enum RetrievalError {
    /// Store unreachable, collection missing, or query rejected.
    /// Callers treat this as non-fatal and fall back to default context.
    Unavailable(String),
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalError::Unavailable(detail) => {
                write!(f, "context store unavailable: {}", detail)
            }
        }
    }
}

impl std::error::Error for RetrievalError {}

/// Contract for similarity search over the evaluation-guideline corpus
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Return up to `k` guideline passages ranked by similarity to `text`
    async fn query(&self, text: &str, k: usize) -> Result<Vec<String>, RetrievalError>;
}
