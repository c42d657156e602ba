//! # Error Types
//!
//! This module defines error types used throughout the collagist library.
//!
//! The variants mirror how failures propagate:
//!
//! - [`CollageError::Decode`] aborts one image's pipeline stage only
//! - [`CollageError::Validation`] aborts before any drawing begins
//! - [`CollageError::Render`] aborts the whole compositing pass
//! - [`CollageError::Unsupported`] means the host cannot provide a drawing surface

use thiserror::Error;

/// Main error type for collagist operations
#[derive(Debug, Error)]
pub enum CollageError {
    /// A source or cropped image could not be read or decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid geometry or out-of-range parameters
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failure during the compositing pass itself
    #[error("Render error: {0}")]
    Render(String),

    /// Drawing surface or font unavailable in the host environment
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Encoding a finished raster into a file format failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CollageResult<T> = Result<T, CollageError>;

impl CollageError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert!(CollageError::decode("x").to_string().starts_with("Decode error:"));
        assert!(CollageError::validation("x").to_string().starts_with("Validation error:"));
        assert!(CollageError::render("x").to_string().starts_with("Render error:"));
        assert!(CollageError::unsupported("x").to_string().starts_with("Unsupported:"));
        assert!(CollageError::encode("x").to_string().starts_with("Encode error:"));
    }

    #[test]
    fn test_io_conversion() {
        let err: CollageError = std::io::Error::other("disk full").into();
        assert!(matches!(err, CollageError::Io(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
