//! Optimistic apply, commit and rollback of patch batches.

use std::sync::Arc;

use settings_core::{EffectiveDocument, PatchOp, apply_ops};
use tokio::runtime::Handle;
use tracing::{debug, info, instrument, warn};

use super::locks::ScopeLocks;
use super::state::{MutationPhase, MutationStates};
use crate::cache::{CacheEntry, CacheStore, DocumentResult, ScopeKey};
use crate::error::SyncError;
use crate::revalidate::RevalidationClient;
use crate::transport::SettingsTransport;

/// Applies patch batches to the cache optimistically and settles them
/// against the server.
///
/// Calls for the same scope key run one at a time in arrival order; a new
/// call waits for the previous one instead of cancelling it. Calls for
/// different keys proceed independently. A refused batch is never retried.
pub struct MutationEngine {
    transport: Arc<dyn SettingsTransport>,
    store: Arc<CacheStore>,
    revalidator: RevalidationClient,
    locks: ScopeLocks,
    states: MutationStates,
    reconcile: bool,
}

impl MutationEngine {
    /// Creates an engine sharing the transport and store of `revalidator`.
    pub fn new(revalidator: RevalidationClient) -> Self {
        Self {
            transport: Arc::clone(revalidator.transport()),
            store: Arc::clone(revalidator.store()),
            revalidator,
            locks: ScopeLocks::new(),
            states: MutationStates::new(),
            reconcile: true,
        }
    }

    /// Enables or disables the background revalidation after each batch.
    pub fn with_reconciliation(mut self, enabled: bool) -> Self {
        self.reconcile = enabled;
        self
    }

    /// Returns the phase of the latest batch for `key`.
    pub fn phase(&self, key: &ScopeKey) -> MutationPhase {
        self.states.phase(key)
    }

    pub fn states(&self) -> &MutationStates {
        &self.states
    }

    pub fn locks(&self) -> &ScopeLocks {
        &self.locks
    }

    /// Applies `ops` to the document cached for `key` and submits them.
    ///
    /// 1. Snapshot the cached entry.
    /// 2. Install the patched blob under the old etag, if an entry exists.
    /// 3. Submit the batch for `key`'s scope.
    /// 4. On success install the server's document wholesale.
    /// 5. On failure reinstall the snapshot exactly.
    /// 6. Start a background revalidation; its outcome never changes the
    ///    result of this call.
    ///
    /// Dropping the returned future before the server answers counts as a
    /// failure: the snapshot is reinstalled, the batch is recorded as rolled
    /// back and the revalidation still runs.
    ///
    /// # Errors
    ///
    /// - `SyncError::InvalidPatch` if the batch is empty or a key is not a
    ///   well-formed dot-path; nothing is changed or sent
    /// - `SyncError::Mutation` if the server refused the batch
    /// - `SyncError::Unauthorized`, `SyncError::Transport`, `SyncError::Timeout`
    ///   as reported by the transport, after rolling back
    #[instrument(skip(self, key, ops), fields(key = %key, ops = ops.len()))]
    pub async fn apply(&self, key: &ScopeKey, ops: &[PatchOp]) -> DocumentResult {
        validate_batch(ops)?;

        let _guard = self.locks.acquire(key).await;

        let snapshot = self.store.get(key);
        match &snapshot {
            Some(entry) => {
                let blob = apply_ops(entry.document().blob(), ops);
                self.store
                    .put_optimistic(key, entry.document().with_blob(blob));
                debug!(etag = %entry.document().etag(), "Optimistic blob visible");
            },
            None => debug!("No cached document, skipping optimistic apply"),
        }
        self.states.record_optimistic(key);

        let pending = PendingBatch {
            engine: self,
            key,
            snapshot,
            settled: false,
        };

        match self.transport.submit_patch(key, ops).await {
            Ok(document) => Ok(pending.commit(document)),
            Err(e) => Err(pending.roll_back(e.into_mutation_error())),
        }
    }

    fn roll_back(&self, key: &ScopeKey, snapshot: Option<&CacheEntry>, reason: String) {
        if let Some(entry) = snapshot {
            self.store.restore(key, entry);
        }
        self.states.record_rollback(key, reason);
        self.store.metrics().record_rollback();
    }

    fn spawn_reconciliation(&self, key: &ScopeKey) {
        if !self.reconcile {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!(key = %key, "No runtime available, skipping reconciliation");
            return;
        };

        let revalidator = self.revalidator.clone();
        let key = key.clone();
        let since = self.store.latest_generation();

        runtime.spawn(async move {
            match revalidator.revalidate_since(&key, since).await {
                Ok(document) => {
                    debug!(key = %key, etag = %document.etag(), "Reconciled after mutation")
                },
                Err(e) => warn!(key = %key, "Reconciliation failed: {}", e),
            }
        });
    }
}

/// A submitted batch that has not been settled yet.
///
/// Settling consumes it. If it is dropped unsettled, because the caller
/// stopped waiting for the server, the snapshot is reinstalled.
struct PendingBatch<'a> {
    engine: &'a MutationEngine,
    key: &'a ScopeKey,
    snapshot: Option<CacheEntry>,
    settled: bool,
}

impl PendingBatch<'_> {
    fn commit(mut self, document: EffectiveDocument) -> Arc<EffectiveDocument> {
        self.settled = true;
        let engine = self.engine;

        let entry = engine.store.put(self.key, document);
        engine.states.record_commit(self.key);
        engine.store.metrics().record_commit();
        info!(etag = %entry.document().etag(), "Mutation committed");

        engine.spawn_reconciliation(self.key);
        Arc::clone(entry.document())
    }

    fn roll_back(mut self, error: SyncError) -> SyncError {
        self.settled = true;

        self.engine
            .roll_back(self.key, self.snapshot.as_ref(), error.to_string());
        warn!("Mutation rolled back: {}", error);

        self.engine.spawn_reconciliation(self.key);
        error
    }
}

impl Drop for PendingBatch<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        self.engine.roll_back(
            self.key,
            self.snapshot.as_ref(),
            "cancelled before the server answered".to_string(),
        );
        warn!(key = %self.key, "Mutation cancelled, snapshot restored");
        self.engine.spawn_reconciliation(self.key);
    }
}

/// Refuses batches the server could not apply as a whole.
fn validate_batch(ops: &[PatchOp]) -> Result<(), SyncError> {
    if ops.is_empty() {
        return Err(SyncError::InvalidPatch("patch batch is empty".to_string()));
    }
    for op in ops {
        op.validate()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_batch() {
        assert!(validate_batch(&[PatchOp::set("ui.theme", "dark"), PatchOp::unset("ui.density")]).is_ok());

        assert!(matches!(validate_batch(&[]), Err(SyncError::InvalidPatch(_))));
        assert!(matches!(
            validate_batch(&[PatchOp::set("ui..theme", "dark")]),
            Err(SyncError::InvalidPatch(_))
        ));
        assert!(matches!(
            validate_batch(&[PatchOp::unset("")]),
            Err(SyncError::InvalidPatch(_))
        ));
    }
}
