//! Settings server transport abstraction.
//!
//! The engine talks to the resolution endpoint only through
//! [`SettingsTransport`], so tests can substitute a scripted transport for
//! the HTTP one.

mod http;
mod wire;

pub use http::HttpTransport;
pub use wire::DocumentPayload;

use async_trait::async_trait;
use settings_core::{EffectiveDocument, Etag, PatchOp};

use crate::cache::ScopeKey;
use crate::error::SyncError;

/// Result of a conditional fetch.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The server sent a new document.
    Modified(EffectiveDocument),
    /// The server confirmed the known ETag is current.
    NotModified,
}

impl FetchOutcome {
    /// Label used for logs and the revalidation outcome metric.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Modified(_) => "modified",
            Self::NotModified => "not_modified",
        }
    }
}

/// A connection to the settings server.
///
/// # Implementors
///
/// - `HttpTransport` - talks to the REST endpoints with `reqwest`
#[async_trait]
pub trait SettingsTransport: Send + Sync {
    /// Fetches the effective document for a scope.
    ///
    /// When `known_etag` is given the request is conditional and the server
    /// may answer [`FetchOutcome::NotModified`].
    ///
    /// # Errors
    ///
    /// - `SyncError::Unauthorized` on 401
    /// - `SyncError::Http` on any other non-success status
    /// - `SyncError::Transport` / `SyncError::Timeout` if no response arrived
    async fn fetch_effective(
        &self,
        key: &ScopeKey,
        known_etag: Option<&Etag>,
    ) -> Result<FetchOutcome, SyncError>;

    /// Submits a patch batch for the scope behind `key` and returns the
    /// server's authoritative document for that scope.
    ///
    /// Operations without their own scope override target `key`'s scope.
    async fn submit_patch(
        &self,
        key: &ScopeKey,
        ops: &[PatchOp],
    ) -> Result<EffectiveDocument, SyncError>;

    /// Returns the name of this transport for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use settings_core::{SettingsTree, apply_ops};

    struct EchoTransport;

    #[async_trait]
    impl SettingsTransport for EchoTransport {
        async fn fetch_effective(
            &self,
            _key: &ScopeKey,
            known_etag: Option<&Etag>,
        ) -> Result<FetchOutcome, SyncError> {
            match known_etag {
                Some(_) => Ok(FetchOutcome::NotModified),
                None => Ok(FetchOutcome::Modified(EffectiveDocument::new(
                    SettingsTree::new(),
                    "e1",
                    Utc::now(),
                ))),
            }
        }

        async fn submit_patch(
            &self,
            _key: &ScopeKey,
            ops: &[PatchOp],
        ) -> Result<EffectiveDocument, SyncError> {
            let blob = apply_ops(&SettingsTree::new(), ops);
            Ok(EffectiveDocument::new(blob, "e2", Utc::now()))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_conditional_fetch() {
        let transport = EchoTransport;
        let key = ScopeKey::session();

        let outcome = transport.fetch_effective(&key, None).await.unwrap();
        assert_eq!(outcome.label(), "modified");

        let etag = Etag::new("e1");
        let outcome = transport.fetch_effective(&key, Some(&etag)).await.unwrap();
        assert_eq!(outcome.label(), "not_modified");
    }

    #[tokio::test]
    async fn test_submit_patch() {
        let transport = EchoTransport;

        let doc = transport
            .submit_patch(&ScopeKey::session(), &[PatchOp::set("ui.theme", "dark")])
            .await
            .unwrap();

        assert_eq!(doc.blob().get("ui.theme").unwrap().as_str(), Some("dark"));
        assert_eq!(transport.name(), "echo");
    }
}
