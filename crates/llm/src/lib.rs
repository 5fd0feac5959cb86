//! Text-completion capability for talentsift.
//!
//! The pipeline consumes one narrow interface — `complete(prompt) -> text` —
//! in exactly two places: query expansion before retrieval and candidate
//! reranking after fusion. Both degrade to a deterministic fallback when the
//! service is unconfigured or misbehaves; neither ever fails the request.

use async_trait::async_trait;
use thiserror::Error;

mod expand;
mod gemini;
mod rerank;

pub use expand::{Expansion, QueryExpander};
pub use gemini::GeminiClient;
pub use rerank::{CandidateDetail, CandidateReranker, Selection};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

/// Why an expansion or rerank step fell back to its deterministic default.
/// Retained so the orchestrator can log the cause instead of discarding it.
#[derive(Debug)]
pub enum FallbackCause {
    /// No completion service is configured.
    Unconfigured,
    /// The service call itself failed (transport, timeout, bad status).
    ServiceError(CompletionError),
    /// The response could not be parsed into a usable selection.
    MalformedSelection(String),
    /// The parsed selection contained no usable ids.
    EmptySelection,
}

impl std::fmt::Display for FallbackCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "completion service not configured"),
            Self::ServiceError(e) => write!(f, "{}", e),
            Self::MalformedSelection(detail) => write!(f, "unparseable selection: {}", detail),
            Self::EmptySelection => write!(f, "selection contained no usable ids"),
        }
    }
}

/// Narrow capability: send one prompt, receive one text response.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Stub service returning a fixed response. Lets tests script the expander
/// and reranker deterministically.
pub struct StaticCompletion {
    pub response: String,
}

#[async_trait]
impl CompletionService for StaticCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        Ok(self.response.clone())
    }
}
