//! Error types for ColorForge.

use thiserror::Error;

/// Main error type for ColorForge operations.
///
/// Cache lookups never produce one of these; absence is `None`. Errors only
/// surface at the edges, where configuration is read and validated.
#[derive(Error, Debug)]
pub enum ColorForgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for ColorForge operations.
pub type Result<T> = std::result::Result<T, ColorForgeError>;
