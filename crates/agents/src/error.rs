//! Agent error types

use thiserror::Error;

/// Hard failures that abort a request. Soft collaborator failures never
/// surface here; stages record them as degraded outcomes instead.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid request: {0}")]
    Validation(#[from] graphrag_core::CoreError),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Store error: {0}")]
    Store(#[from] graphrag_store::StoreError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Chat completion failures
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed completion: {0}")]
    Malformed(String),

    #[error("Completion contained no text")]
    EmptyCompletion,
}

pub type Result<T> = std::result::Result<T, AgentError>;
