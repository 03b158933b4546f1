//! Client error types

use formpart_core::{EncodeError, ErrorKind};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Form encoding error
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Non-success response
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Encoding task did not complete
    #[error("Encoding task failed: {0}")]
    Task(String),
}

impl ClientError {
    /// Check if the request was rejected before reaching the network
    pub fn is_encode_error(&self) -> bool {
        matches!(self, Self::Encode(_))
    }

    /// Get the encode error kind, if this is an encode error
    pub fn encode_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Encode(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Get the response status, if the server answered with a failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for ClientError {
    fn from(err: tokio::task::JoinError) -> Self {
        ClientError::Task(err.to_string())
    }
}
