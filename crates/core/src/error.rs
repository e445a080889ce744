//! Error types for the Knowhow copilot.
//!
//! This module defines a unified error enum covering every error category
//! in the system: configuration, I/O, input validation, chunking,
//! embedding-dimension mismatches, generation backend faults, and index
//! storage errors.

use thiserror::Error;

/// Unified error type for the Knowhow copilot.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
///
/// Degraded-but-successful outcomes (an unparsable analysis response, a
/// follow-up list shorter than requested) are NOT errors; they are carried
/// as fallback markers on the result types themselves.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid chunking parameters (overlap >= size, or zero values)
    #[error("Invalid chunk configuration: {0}")]
    InvalidChunkConfig(String),

    /// Invalid caller-supplied argument (bad k, empty query text)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Input text exceeds the configured maximum length
    #[error("Input too long: {actual} chars (maximum {max})")]
    InputTooLong { actual: usize, max: usize },

    /// Generation backend timed out or faulted; no partial text is returned
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Query or chunk embedding does not match the index dimensionality.
    /// This is a configuration-level fault, not a recoverable runtime one.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    /// Embedding index storage errors
    #[error("Index error: {0}")]
    Index(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
