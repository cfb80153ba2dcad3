//! The server-computed effective-settings document and its version token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tree::SettingsTree;

/// Opaque version token issued by the settings server.
///
/// Two documents with equal tokens have byte-identical blobs. The client
/// never inspects the token beyond equality and echoing it back in
/// `If-None-Match`.
///
/// # Example
///
/// ```
/// use settings_core::Etag;
///
/// let etag = Etag::new("\"e1\"");
/// assert_eq!(etag.as_str(), "\"e1\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Etag(String);

impl Etag {
    /// Creates a new token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Etag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Etag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Etag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Effective settings for one scope, as resolved by the server.
///
/// Serialized as `{ "blob": {...}, "etag": "...", "computedAt": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveDocument {
    blob: SettingsTree,
    etag: Etag,
    computed_at: DateTime<Utc>,
}

impl EffectiveDocument {
    /// Creates a document from its parts.
    pub fn new(blob: SettingsTree, etag: impl Into<Etag>, computed_at: DateTime<Utc>) -> Self {
        Self {
            blob,
            etag: etag.into(),
            computed_at,
        }
    }

    /// Returns the settings tree.
    pub fn blob(&self) -> &SettingsTree {
        &self.blob
    }

    /// Returns the version token.
    pub fn etag(&self) -> &Etag {
        &self.etag
    }

    /// Returns when the server computed this document.
    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    /// Returns a copy carrying `blob` but keeping this document's etag and
    /// timestamp. Used for provisional (optimistic) documents.
    pub fn with_blob(&self, blob: SettingsTree) -> Self {
        Self {
            blob,
            etag: self.etag.clone(),
            computed_at: self.computed_at,
        }
    }

    /// Consumes the document and returns its tree.
    pub fn into_blob(self) -> SettingsTree {
        self.blob
    }
}
