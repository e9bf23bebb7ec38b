//! Registry error types.

use thiserror::Error;

/// Errors raised by the registry, its storage backends and the dispatcher.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("User already registered: {0}")]
    DuplicateUser(String),

    // The token itself is a secret and stays out of the message.
    #[error("Token already in use")]
    DuplicateToken,

    #[error("Corrupt registry data: {0}")]
    CorruptData(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a message transport.
#[derive(Debug, Error)]
#[error("Transport error: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
