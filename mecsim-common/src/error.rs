//! Error types for mecsim

use thiserror::Error;

/// Error types for the mecsim library.
#[derive(Debug, Error)]
pub enum Error {
    /// Split-ratio actions outside the `[0, 1]` range.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Negative bandwidth, compute capacity or demand passed to a channel or
    /// queue function.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An operation invoked in a state that forbids it, e.g. stepping a
    /// terminated episode or processing a job before it was transferred.
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result alias used throughout mecsim.
pub type Result<T> = std::result::Result<T, Error>;
