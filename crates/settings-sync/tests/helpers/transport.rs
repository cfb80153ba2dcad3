//! Scripted in-memory transport.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use settings_core::{EffectiveDocument, Etag, PatchOp};
use settings_sync::cache::ScopeKey;
use settings_sync::{FetchOutcome, SettingsTransport, SyncError};
use tokio::sync::{Notify, oneshot};

struct Step<T> {
    result: Result<T, SyncError>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Transport that replays queued responses in order.
///
/// A gated response is held until its sender fires (or is dropped), which
/// lets a test observe the engine mid-request. An exhausted script answers
/// with a transport error.
#[derive(Default)]
pub struct MockTransport {
    fetches: Mutex<VecDeque<Step<FetchOutcome>>>,
    patches: Mutex<VecDeque<Step<EffectiveDocument>>>,
    fetch_calls: AtomicUsize,
    patch_calls: AtomicUsize,
    fetch_etags: Mutex<Vec<Option<String>>>,
    submitted: Mutex<Vec<Vec<PatchOp>>>,
    submitted_keys: Mutex<Vec<ScopeKey>>,
    fetch_started: Notify,
    patch_started: Notify,
}

impl MockTransport {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn push_fetch(&self, result: Result<FetchOutcome, SyncError>) {
        self.fetches.lock().push_back(Step { result, gate: None });
    }

    pub fn push_modified(&self, doc: EffectiveDocument) {
        self.push_fetch(Ok(FetchOutcome::Modified(doc)));
    }

    pub fn push_fetch_gated(&self, result: Result<FetchOutcome, SyncError>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.fetches.lock().push_back(Step {
            result,
            gate: Some(rx),
        });
        tx
    }

    pub fn push_patch(&self, result: Result<EffectiveDocument, SyncError>) {
        self.patches.lock().push_back(Step { result, gate: None });
    }

    pub fn push_patch_gated(&self, result: Result<EffectiveDocument, SyncError>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.patches.lock().push_back(Step {
            result,
            gate: Some(rx),
        });
        tx
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn patch_calls(&self) -> usize {
        self.patch_calls.load(Ordering::SeqCst)
    }

    /// The `If-None-Match` value of every fetch, in order.
    pub fn fetch_etags(&self) -> Vec<Option<String>> {
        self.fetch_etags.lock().clone()
    }

    /// Every submitted batch, in order.
    pub fn submitted(&self) -> Vec<Vec<PatchOp>> {
        self.submitted.lock().clone()
    }

    /// The scope key of every submitted batch, in order.
    pub fn submitted_keys(&self) -> Vec<ScopeKey> {
        self.submitted_keys.lock().clone()
    }

    /// Resolves once a fetch has reached the transport.
    pub async fn wait_fetch_started(&self) {
        self.fetch_started.notified().await;
    }

    /// Resolves once a patch has reached the transport.
    pub async fn wait_patch_started(&self) {
        self.patch_started.notified().await;
    }
}

async fn play<T>(step: Option<Step<T>>) -> Result<T, SyncError> {
    let Some(step) = step else {
        return Err(SyncError::transport("no scripted response"));
    };
    if let Some(gate) = step.gate {
        let _ = gate.await;
    }
    step.result
}

#[async_trait]
impl SettingsTransport for MockTransport {
    async fn fetch_effective(
        &self,
        _key: &ScopeKey,
        known_etag: Option<&Etag>,
    ) -> Result<FetchOutcome, SyncError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_etags
            .lock()
            .push(known_etag.map(|etag| etag.as_str().to_string()));
        let step = self.fetches.lock().pop_front();
        self.fetch_started.notify_one();
        play(step).await
    }

    async fn submit_patch(
        &self,
        key: &ScopeKey,
        ops: &[PatchOp],
    ) -> Result<EffectiveDocument, SyncError> {
        self.patch_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().push(ops.to_vec());
        self.submitted_keys.lock().push(key.clone());
        let step = self.patches.lock().pop_front();
        self.patch_started.notify_one();
        play(step).await
    }

    fn name(&self) -> &str {
        "mock"
    }
}
