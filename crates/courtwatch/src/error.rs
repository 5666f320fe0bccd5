//! Client error types.

use courtwatch_providers::ProviderError;
use courtwatch_server::{NotifyError, ServerError};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server error.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}

impl ClientError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<NotifyError> for ClientError {
    fn from(err: NotifyError) -> Self {
        Self::Server(ServerError::Notify(err))
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Config(err.to_string())
    }
}
