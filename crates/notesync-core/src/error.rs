//! Error types for notesync-core

use thiserror::Error;

use crate::auth::AuthError;

/// Result type alias using notesync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in notesync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A submission or argument failed local validation
    #[error("{0}")]
    Validation(String),

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API answered with an error payload
    #[error("{0}")]
    Api(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Object storage or inline payload error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Credential rejected or missing
    #[error("{0}")]
    Unauthorized(String),

    /// Session/auth client failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Note or file not found
    #[error("{0}")]
    NotFound(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification used to pick how a failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Authorization,
    NotFound,
    Config,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Http(_)
            | Self::Api(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Storage(_) => ErrorKind::Transport,
            Self::Unauthorized(_) | Self::Auth(_) => ErrorKind::Authorization,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}
