//! Error types for logtree

use thiserror::Error;

/// Error type carried by a failing processor callback.
pub type ProcessorError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for logtree operations
#[derive(Error, Debug)]
pub enum LogError {
    /// Logger name is malformed (empty path segment)
    #[error("Invalid logger name: {0:?}")]
    InvalidName(String),

    /// A processor callback failed; the emit for that call is aborted
    #[error("Processor error: {0}")]
    Processor(#[source] ProcessorError),

    /// General I/O error (proxy transport, endpoint file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error during wire serialization/deserialization
    #[error("Wire error: {0}")]
    Wire(#[from] serde_json::Error),

    /// A wire record parsed but carries unusable fields
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// No proxy endpoint is published in the environment
    #[error("No proxy endpoint available")]
    ProxyUnavailable,
}

/// Result type alias using LogError
pub type LogResult<T> = Result<T, LogError>;
