//! Error types for the docbot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all docbot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Embedding errors ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Corpus errors ---
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    // --- Prompt errors ---
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failure to turn a query text into a usable vector.
///
/// Always per-request: the chat turn that hit it can be aborted or retried
/// without touching the corpus or other requests.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding service failed: {0}")]
    Service(#[from] ProviderError),

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("Query embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Failure to load the embedded corpus at startup.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read corpus at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse corpus: {0}")]
    Parse(String),

    #[error("Malformed corpus record #{position}: {reason}")]
    Malformed { position: usize, reason: String },

    /// A stored vector disagrees with the configured dimensionality.
    /// The whole load is rejected when this happens.
    #[error(
        "Corpus record #{position} ({url}) has {actual} dimensions, expected {expected}"
    )]
    DimensionMismatch {
        position: usize,
        url: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read prompt template at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Prompt template must contain `{placeholder}` exactly once, found {found}")]
    Placeholder {
        placeholder: &'static str,
        found: usize,
    },
}
