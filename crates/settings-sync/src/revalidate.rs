//! Conditional fetches that keep the cache in step with the server.

use std::sync::Arc;

use settings_core::Etag;
use tracing::{debug, instrument, warn};

use crate::cache::{CacheStore, DocumentResult, Install, ScopeKey};
use crate::error::SyncError;
use crate::transport::{FetchOutcome, SettingsTransport};

/// Revalidates cached documents against the resolution endpoint.
///
/// Every call makes at most one request; retries belong to the caller.
/// Concurrent calls for the same key share one request through
/// [`CacheStore::coalesce`].
#[derive(Clone)]
pub struct RevalidationClient {
    transport: Arc<dyn SettingsTransport>,
    store: Arc<CacheStore>,
}

impl RevalidationClient {
    pub fn new(transport: Arc<dyn SettingsTransport>, store: Arc<CacheStore>) -> Self {
        Self { transport, store }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn transport(&self) -> &Arc<dyn SettingsTransport> {
        &self.transport
    }

    /// Revalidates `key` using the ETag of the cached document, if any.
    pub async fn revalidate(&self, key: &ScopeKey) -> DocumentResult {
        let known_etag = self
            .store
            .get(key)
            .map(|entry| entry.document().etag().clone());
        self.revalidate_with(key, known_etag).await
    }

    /// Revalidates `key` with an explicit precondition.
    ///
    /// A 304 returns the cached document itself (same `Arc`); a 200 is
    /// stored unless a newer write landed while the request was in flight,
    /// in which case the newer cached document is returned.
    #[instrument(skip(self, key, known_etag), fields(key = %key, etag = ?known_etag.as_ref().map(Etag::as_str)))]
    pub async fn revalidate_with(&self, key: &ScopeKey, known_etag: Option<Etag>) -> DocumentResult {
        self.store
            .coalesce(key, || self.fetch_and_store(key, known_etag))
            .await
    }

    /// Revalidates `key` with a request that left after store generation
    /// `since`.
    ///
    /// Used after a write: a revalidation already in flight may predate the
    /// write, so it is joined only if it started at or after `since`.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn revalidate_since(&self, key: &ScopeKey, since: u64) -> DocumentResult {
        let known_etag = self
            .store
            .get(key)
            .map(|entry| entry.document().etag().clone());
        self.store
            .coalesce_since(key, since, || self.fetch_and_store(key, known_etag))
            .await
    }

    async fn fetch_and_store(&self, key: &ScopeKey, known_etag: Option<Etag>) -> DocumentResult {
        let observed = self.store.generation(key);
        let metrics = self.store.metrics();

        let outcome = match self.transport.fetch_effective(key, known_etag.as_ref()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                metrics.record_revalidation("error");
                warn!(transport = self.transport.name(), "Revalidation failed: {}", e);
                return Err(e);
            },
        };
        metrics.record_revalidation(outcome.label());

        match outcome {
            FetchOutcome::NotModified => {
                let etag = known_etag.ok_or_else(|| {
                    SyncError::invalid_response("304 Not Modified for an unconditional request")
                })?;
                debug!(etag = %etag, "Not modified");
                self.store.mark_validated(key, &etag).ok_or_else(|| {
                    SyncError::invalid_response("304 Not Modified but no document is cached")
                })
            },
            FetchOutcome::Modified(document) => {
                let etag = document.etag().clone();
                let (install, current) = self.store.put_if_current(key, document, observed);
                match install {
                    Install::Replaced => debug!(etag = %etag, "Stored revalidated document"),
                    Install::Reused => debug!(etag = %etag, "Revalidated document unchanged"),
                    Install::Discarded => {
                        debug!(etag = %etag, current = %current.etag(), "Kept newer cached document")
                    },
                }
                Ok(current)
            },
        }
    }
}
