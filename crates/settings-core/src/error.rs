//! Error types for the settings domain.
//!
//! Everything in this crate is pure and synchronous, so the error surface is
//! small: malformed paths, documents that fail to parse, and typed section
//! reads that do not match the stored shape.
//!
//! # Example
//!
//! ```
//! use settings_core::{Result, SettingsError};
//!
//! fn checked_key(key: &str) -> Result<&str> {
//!     if key.is_empty() {
//!         return Err(SettingsError::invalid_path(key, "path cannot be empty"));
//!     }
//!     Ok(key)
//! }
//!
//! assert!(checked_key("ui.theme").is_ok());
//! assert!(checked_key("").unwrap_err().is_invalid_path());
//! ```

use thiserror::Error;

/// Main error type for settings domain operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A dot-path is malformed (empty, or contains an empty segment).
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// A document or value could not be parsed or serialized.
    #[error("Failed to parse settings from '{source_name}': {message}")]
    ParseError {
        /// Where the content came from (e.g. "json_source", a file name)
        source_name: String,
        /// What the parser reported
        message: String,
        /// The parser's own error, when one was kept
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored value does not have the shape a typed section expects.
    #[error("Section '{path}' has an unexpected shape: {message}")]
    SectionMismatch {
        /// Path of the section that was read
        path: String,
        /// Deserializer message
        message: String,
    },
}

impl SettingsError {
    /// Creates an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Parse failure described only by a message.
    pub fn parse_error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            source_name: source.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Parse failure that keeps the parser's error as its source.
    pub fn parse_error_with_cause<E>(
        source: impl Into<String>,
        message: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ParseError {
            source_name: source.into(),
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates a SectionMismatch error.
    pub fn section_mismatch(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SectionMismatch {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error is a rejected path.
    pub fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }

    /// Returns true if a document failed to parse or serialize.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError { .. })
    }

    /// Returns true if a typed section read failed.
    pub fn is_section_mismatch(&self) -> bool {
        matches!(self, Self::SectionMismatch { .. })
    }
}

/// Type alias for Results with SettingsError.
pub type Result<T> = std::result::Result<T, SettingsError>;
