//! Error types for mapping operations.

use thiserror::Error;

/// Mapping error type.
///
/// Classification never fails and response parse failures are reported on
/// the response itself, so these cover precondition violations and failures
/// before a request could be sent.
#[derive(Error, Debug)]
pub enum MappingError {
    /// A caller-supplied argument cannot be used.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Client settings are incomplete or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The transport could not be built.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The blocking runtime could not be started.
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result type alias for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;
