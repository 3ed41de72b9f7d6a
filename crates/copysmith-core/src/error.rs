//! Unified error types for Copysmith

use thiserror::Error;

/// Unified error type for all Copysmith operations
///
/// Expected, frequent failures (tool errors, parse failures, unscorable
/// drafts) are encoded as data at the boundary where they occur and never
/// surface here. These variants cover structural failures only.
#[derive(Error, Debug)]
pub enum CopysmithError {
    // Completion service errors
    #[error("Completion API error: {0}")]
    Api(String),

    #[error("Completion API limit: {0}")]
    ApiLimit(String),

    #[error("Circuit breaker '{name}' is open - retry in {retry_after_secs}s")]
    CircuitOpen { name: String, retry_after_secs: u64 },

    // Conversation errors
    #[error("Conversation hit {limit} turns without a final answer")]
    MaxIterationsExceeded { limit: usize },

    #[error("Completion service returned unexpected stop reason: {0}")]
    UnexpectedStopReason(String),

    // Workflow errors
    #[error("No usable draft: {0}")]
    NoDraft(String),

    // Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl CopysmithError {
    /// Retry-after hint in seconds, if this error carries one.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            CopysmithError::CircuitOpen {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

/// Result type alias using CopysmithError
pub type Result<T> = std::result::Result<T, CopysmithError>;
