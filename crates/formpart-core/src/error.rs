//! Encoder error types

use crate::value::ValueKind;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, EncodeError>;

/// Coarse classification of an [`EncodeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The form itself was missing
    InvalidInput,
    /// The declared payload is not a form; a programming error in the caller
    UnsupportedShape,
    /// Reading a file or serializing a value failed
    EncodeFailure,
}

/// Errors raised while encoding a multipart form
#[derive(Error, Debug)]
pub enum EncodeError {
    /// Missing or malformed input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Declared payload shape is not a form
    #[error("unsupported payload shape: expected {expected}, got {actual}")]
    UnsupportedShape {
        expected: &'static str,
        actual: &'static str,
    },

    /// Reading a file source failed
    #[error("cannot encode multipart file '{filename}': {source}")]
    FileRead {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// File source length differs from its declared size
    #[error("file '{filename}' declared {declared} bytes but its stream {actual}")]
    SizeMismatch {
        filename: String,
        declared: u64,
        actual: String,
    },

    /// No registered converter accepts the value
    #[error("no converter can write a {kind} value as {content_type}")]
    NoConverter {
        kind: ValueKind,
        content_type: String,
    },

    /// Declared file content type is not a valid media type
    #[error("invalid content type: {value:?}")]
    InvalidContentType { value: String },

    /// Value serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Writing to the output sink failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodeError {
    /// Create an error for a null form
    pub fn null_form() -> Self {
        Self::InvalidInput("cannot encode null form".to_string())
    }

    /// Get the error classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::UnsupportedShape { .. } => ErrorKind::UnsupportedShape,
            Self::FileRead { .. }
            | Self::SizeMismatch { .. }
            | Self::NoConverter { .. }
            | Self::InvalidContentType { .. }
            | Self::Serialization(_)
            | Self::Io(_) => ErrorKind::EncodeFailure,
        }
    }

    /// Check if the caller misused the encoder rather than hit a runtime failure
    pub fn is_caller_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidInput | ErrorKind::UnsupportedShape)
    }
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        EncodeError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EncodeError::null_form().kind(), ErrorKind::InvalidInput);

        let shape = EncodeError::UnsupportedShape {
            expected: "form",
            actual: "json",
        };
        assert_eq!(shape.kind(), ErrorKind::UnsupportedShape);
        assert!(shape.is_caller_error());

        let io = EncodeError::FileRead {
            filename: "a.txt".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(io.kind(), ErrorKind::EncodeFailure);
        assert!(!io.is_caller_error());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EncodeError::null_form().to_string(),
            "invalid input: cannot encode null form"
        );

        let err = EncodeError::NoConverter {
            kind: ValueKind::Null,
            content_type: "text/plain".to_string(),
        };
        assert_eq!(err.to_string(), "no converter can write a null value as text/plain");
    }
}
