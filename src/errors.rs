//! Error types for PartAssist
//!
//! One variant per failure class of the answer pipeline. A missing or
//! malformed product block in generated text is deliberately absent here:
//! it resolves to "no product card", never to an error.

use thiserror::Error;

/// Main error type for the assistant
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Missing credentials or invalid settings; fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// A corpus line could not be parsed into a part record
    #[error("Corpus format error at line {line}: {reason}")]
    CorpusFormat { line: usize, reason: String },

    /// The semantic index could not be opened, read or written
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Embedding or generation service failure
    #[error("Generation failure: {0}")]
    Generation(String),

    /// Embedding length does not match the index dimension
    #[error("Embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A unit violates the index invariants (empty text or embedding)
    #[error("Invalid index unit: {0}")]
    InvalidUnit(String),

    /// Index database errors
    #[error("Index storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssistantError {
    /// Whether this error must stop the process before it serves traffic
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(self, AssistantError::Config(_))
    }

    /// Stable machine-readable code used by the HTTP layer
    pub fn code(&self) -> &'static str {
        match self {
            AssistantError::RetrievalUnavailable(_)
            | AssistantError::DimensionMismatch { .. }
            | AssistantError::Storage(_) => "RETRIEVAL_UNAVAILABLE",
            AssistantError::Generation(_) | AssistantError::Http(_) => "GENERATION_FAILED",
            _ => "INTERNAL",
        }
    }
}

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;
