//! Error types for revalidation and mutation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Problem-details body returned by the settings server on failure.
///
/// Every field is optional on the wire; servers in the field omit `type`
/// and `timestamp` routinely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Problem {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Problem {
    /// Best human-readable description: `detail`, then `title`.
    pub fn description(&self) -> Option<&str> {
        self.detail.as_deref().or(self.title.as_deref())
    }
}

/// A patch batch the server refused. The cache has already been rolled back
/// when a caller sees this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationError {
    pub status: u16,
    pub detail: String,
}

impl MutationError {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}: {}", self.status, self.detail)
    }
}

impl std::error::Error for MutationError {}

/// Errors surfaced by the synchronization engine.
///
/// The type is `Clone` because a coalesced revalidation hands the same
/// outcome to every waiting caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete in time.
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The server answered 401; the caller must re-authenticate.
    #[error("unauthorized: authentication required")]
    Unauthorized,

    /// Non-success status on a read.
    #[error("server responded with status {status}: {}", .problem.as_ref().and_then(Problem::description).unwrap_or("no details"))]
    Http {
        status: u16,
        problem: Option<Problem>,
    },

    /// The server rejected a patch batch.
    #[error("mutation rejected with {0}")]
    Mutation(MutationError),

    /// The response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The patch batch was refused locally before anything was sent.
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
}

impl SyncError {
    /// Creates a new transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates an error for a non-success status.
    pub fn http(status: u16, problem: Option<Problem>) -> Self {
        Self::Http { status, problem }
    }

    /// Creates a new invalid response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Returns the HTTP status behind this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Http { status, .. } => Some(*status),
            Self::Mutation(err) => Some(err.status),
            _ => None,
        }
    }

    /// Returns true if the caller must re-authenticate.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns true if a retry policy may try the operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout { .. } | Self::Http { .. }
        )
    }

    /// Converts a failed PATCH into the error surfaced to `apply` callers.
    ///
    /// Status failures become [`SyncError::Mutation`]; authentication and
    /// transport failures keep their own variants.
    pub fn into_mutation_error(self) -> Self {
        match self {
            Self::Http { status, problem } => {
                let detail = problem
                    .as_ref()
                    .and_then(Problem::description)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("request failed with status {}", status));
                Self::Mutation(MutationError::new(status, detail))
            },
            other => other,
        }
    }
}

impl From<settings_core::SettingsError> for SyncError {
    fn from(err: settings_core::SettingsError) -> Self {
        if err.is_invalid_path() {
            Self::InvalidPatch(err.to_string())
        } else {
            Self::InvalidResponse(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::transport("connection refused");
        assert_eq!(err.to_string(), "transport error: connection refused");

        let err = SyncError::http(
            503,
            Some(Problem {
                detail: Some("maintenance".to_string()),
                ..Problem::default()
            }),
        );
        assert_eq!(err.to_string(), "server responded with status 503: maintenance");

        let err = SyncError::http(500, None);
        assert_eq!(err.to_string(), "server responded with status 500: no details");
    }

    #[test]
    fn test_is_retryable() {
        assert!(SyncError::transport("reset").is_retryable());
        assert!(SyncError::Timeout { seconds: 10 }.is_retryable());
        assert!(SyncError::http(502, None).is_retryable());
        assert!(!SyncError::Unauthorized.is_retryable());
        assert!(!SyncError::invalid_response("not json").is_retryable());
        assert!(!SyncError::InvalidPatch("empty".into()).is_retryable());
    }

    #[test]
    fn test_into_mutation_error_uses_problem_detail() {
        let problem: Problem = serde_json::from_str(
            r#"{"type": "about:blank", "title": "Forbidden", "status": 403,
                "detail": "missing settings:write", "timestamp": "2025-09-01T10:00:00Z"}"#,
        )
        .unwrap();

        match SyncError::http(403, Some(problem)).into_mutation_error() {
            SyncError::Mutation(err) => {
                assert_eq!(err.status, 403);
                assert_eq!(err.detail, "missing settings:write");
            },
            other => panic!("expected mutation error, got {other:?}"),
        }
    }

    #[test]
    fn test_into_mutation_error_keeps_auth_and_transport() {
        assert!(SyncError::Unauthorized.into_mutation_error().is_auth());
        assert!(matches!(
            SyncError::transport("down").into_mutation_error(),
            SyncError::Transport(_)
        ));
    }

    #[test]
    fn test_status() {
        assert_eq!(SyncError::Unauthorized.status(), Some(401));
        assert_eq!(
            SyncError::Mutation(MutationError::new(409, "conflict")).status(),
            Some(409)
        );
        assert_eq!(SyncError::transport("x").status(), None);
    }
}
