//! In-memory store of effective documents with request coalescing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use settings_core::{EffectiveDocument, Etag};
use tokio::sync::OnceCell;
use tracing::debug;

use super::ScopeKey;
use crate::error::SyncError;
use crate::metrics::SyncMetrics;

/// Outcome shared by every caller of one coalesced revalidation.
pub type DocumentResult = Result<Arc<EffectiveDocument>, SyncError>;

/// One shared revalidation and the store generation it started at.
#[derive(Clone)]
struct Inflight {
    cell: Arc<OnceCell<DocumentResult>>,
    started_at: u64,
}

/// A cached document plus its freshness bookkeeping.
///
/// Entries are immutable snapshots: every write installs a new entry with a
/// new generation, so a clone taken before a mutation stays valid as a
/// rollback target.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    document: Arc<EffectiveDocument>,
    last_validated_at: Instant,
    generation: u64,
    provisional: bool,
}

impl CacheEntry {
    /// Returns the cached document.
    pub fn document(&self) -> &Arc<EffectiveDocument> {
        &self.document
    }

    /// Returns when the server last confirmed this document.
    pub fn last_validated_at(&self) -> Instant {
        self.last_validated_at
    }

    /// Returns the time since the last confirmation.
    pub fn age(&self) -> Duration {
        self.last_validated_at.elapsed()
    }

    /// Returns true if the entry was confirmed within `max_age`. For an
    /// optimistic preview this is the confirmation of the document it was
    /// derived from.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.age() < max_age
    }

    /// Store-wide write sequence number of this entry.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true while the entry holds an optimistic, unconfirmed blob.
    pub fn is_provisional(&self) -> bool {
        self.provisional
    }
}

/// What a revalidation write did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Install {
    /// The fetched document replaced the entry.
    Replaced,
    /// The etag matched; the existing document was kept and re-validated.
    Reused,
    /// A newer write landed first; the fetched document was dropped.
    Discarded,
}

#[derive(Default)]
struct Slot {
    entry: Option<CacheEntry>,
    inflight: Option<Inflight>,
}

/// In-memory map from [`ScopeKey`] to [`CacheEntry`].
///
/// All operations except [`CacheStore::coalesce`] are synchronous and hold
/// the internal lock only for the duration of the call, so no caller ever
/// observes a partially written entry.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use settings_core::{EffectiveDocument, Scope, SettingsTree};
/// use settings_sync::cache::{CacheStore, ScopeKey};
///
/// let store = CacheStore::default();
/// let key = ScopeKey::from_scope(&Scope::new().with_account_id("acc-1"));
///
/// store.put(&key, EffectiveDocument::new(SettingsTree::new(), "e1", Utc::now()));
/// assert_eq!(store.get(&key).unwrap().document().etag().as_str(), "e1");
/// ```
#[derive(Default)]
pub struct CacheStore {
    slots: RwLock<HashMap<ScopeKey, Slot>>,
    next_generation: AtomicU64,
    metrics: SyncMetrics,
}

impl CacheStore {
    /// Creates an empty store recording into `metrics`.
    pub fn new(metrics: SyncMetrics) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            metrics,
        }
    }

    /// Returns the entry for `key`, if one exists.
    pub fn get(&self, key: &ScopeKey) -> Option<CacheEntry> {
        self.slots.read().get(key).and_then(|slot| slot.entry.clone())
    }

    /// Returns the generation of the entry for `key`.
    pub fn generation(&self, key: &ScopeKey) -> Option<u64> {
        self.get(key).map(|entry| entry.generation)
    }

    /// Atomically replaces the entry with a server-confirmed document.
    pub fn put(&self, key: &ScopeKey, document: impl Into<Arc<EffectiveDocument>>) -> CacheEntry {
        let document = document.into();
        let entry = self.install(key, |generation| CacheEntry {
            document,
            last_validated_at: Instant::now(),
            generation,
            provisional: false,
        });
        debug!(key = %key, etag = %entry.document.etag(), generation = entry.generation, "Cache entry replaced");
        entry
    }

    /// Installs an optimistic preview. The previous confirmation time is
    /// kept because the server has not seen this blob yet.
    pub fn put_optimistic(
        &self,
        key: &ScopeKey,
        document: impl Into<Arc<EffectiveDocument>>,
    ) -> CacheEntry {
        let mut slots = self.slots.write();
        let slot = slots.entry(key.clone()).or_default();
        let last_validated_at = slot
            .entry
            .as_ref()
            .map_or_else(Instant::now, |current| current.last_validated_at);

        let entry = CacheEntry {
            document: document.into(),
            last_validated_at,
            generation: self.bump(),
            provisional: true,
        };
        slot.entry = Some(entry.clone());
        debug!(key = %key, generation = entry.generation, "Optimistic entry installed");
        entry
    }

    /// Reinstalls a snapshot taken earlier, document and etag unchanged.
    pub fn restore(&self, key: &ScopeKey, snapshot: &CacheEntry) -> CacheEntry {
        let entry = self.install(key, |generation| CacheEntry {
            document: Arc::clone(&snapshot.document),
            last_validated_at: snapshot.last_validated_at,
            generation,
            provisional: snapshot.provisional,
        });
        debug!(key = %key, etag = %entry.document.etag(), "Cache entry restored from snapshot");
        entry
    }

    /// Installs a revalidation result unless the cache moved on meanwhile.
    ///
    /// `observed` is the generation the revalidation saw when it started
    /// (`None` if there was no entry). The result is discarded when:
    /// - another write has landed since (`observed` no longer matches),
    /// - the entry is an optimistic preview awaiting its commit, or
    /// - the fetched document was computed before the cached one.
    ///
    /// A document whose etag equals the cached one is not installed; the
    /// cached `Arc` is kept so identity-based change detection holds.
    ///
    /// Returns what happened and the document now visible for `key`.
    pub fn put_if_current(
        &self,
        key: &ScopeKey,
        document: EffectiveDocument,
        observed: Option<u64>,
    ) -> (Install, Arc<EffectiveDocument>) {
        let mut slots = self.slots.write();
        let slot = slots.entry(key.clone()).or_default();

        if let Some(current) = slot.entry.as_mut() {
            let superseded = Some(current.generation) != observed
                || current.provisional
                || document.computed_at() < current.document.computed_at();

            if superseded {
                self.metrics.record_stale_discard();
                debug!(
                    key = %key,
                    fetched = %document.etag(),
                    cached = %current.document.etag(),
                    "Discarding superseded revalidation result"
                );
                return (Install::Discarded, Arc::clone(&current.document));
            }

            if document.etag() == current.document.etag() {
                current.last_validated_at = Instant::now();
                return (Install::Reused, Arc::clone(&current.document));
            }
        }

        let document = Arc::new(document);
        slot.entry = Some(CacheEntry {
            document: Arc::clone(&document),
            last_validated_at: Instant::now(),
            generation: self.bump(),
            provisional: false,
        });
        (Install::Replaced, document)
    }

    /// Records a 304 for `etag` and returns the cached document unchanged.
    ///
    /// The confirmation time only moves when the cached document is the one
    /// the server confirmed: not provisional and carrying `etag`.
    pub fn mark_validated(&self, key: &ScopeKey, etag: &Etag) -> Option<Arc<EffectiveDocument>> {
        let mut slots = self.slots.write();
        let entry = slots.get_mut(key)?.entry.as_mut()?;
        if !entry.provisional && entry.document.etag() == etag {
            entry.last_validated_at = Instant::now();
        }
        Some(Arc::clone(&entry.document))
    }

    /// Runs `fetcher` as the single inflight revalidation for `key`.
    ///
    /// Concurrent callers for the same key await the first caller's fetch
    /// instead of starting their own and all receive its result, success or
    /// error. The inflight handle is cleared once the fetch completes, so
    /// the next call after that starts a new request.
    pub async fn coalesce<F, Fut>(&self, key: &ScopeKey, fetcher: F) -> DocumentResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DocumentResult>,
    {
        self.coalesce_since(key, 0, fetcher).await
    }

    /// Like [`CacheStore::coalesce`], but only joins a revalidation that
    /// started at or after store generation `generation`.
    ///
    /// An older inflight request may have left before a write the caller
    /// needs the server to have seen. In that case `fetcher` runs as a new
    /// request and takes over the inflight slot; the older request still
    /// completes for its own waiters.
    pub async fn coalesce_since<F, Fut>(&self, key: &ScopeKey, generation: u64, fetcher: F) -> DocumentResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DocumentResult>,
    {
        let inflight = {
            let mut slots = self.slots.write();
            let slot = slots.entry(key.clone()).or_default();
            match &slot.inflight {
                Some(current) if current.started_at >= generation => {
                    self.metrics.record_coalesced();
                    debug!(key = %key, "Joining inflight revalidation");
                    current.clone()
                },
                previous => {
                    if let Some(previous) = previous {
                        debug!(
                            key = %key,
                            started_at = previous.started_at,
                            generation,
                            "Inflight revalidation predates generation, starting another"
                        );
                    }
                    let inflight = Inflight {
                        cell: Arc::new(OnceCell::new()),
                        started_at: self.latest_generation(),
                    };
                    slot.inflight = Some(inflight.clone());
                    inflight
                },
            }
        };

        let result = inflight.cell.get_or_init(fetcher).await.clone();

        let mut slots = self.slots.write();
        if let Some(slot) = slots.get_mut(key)
            && slot
                .inflight
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(&current.cell, &inflight.cell))
        {
            slot.inflight = None;
        }

        result
    }

    /// Returns true while a revalidation for `key` is in flight.
    pub fn is_inflight(&self, key: &ScopeKey) -> bool {
        self.slots
            .read()
            .get(key)
            .is_some_and(|slot| slot.inflight.is_some())
    }

    /// Removes the entry for `key`.
    pub fn remove(&self, key: &ScopeKey) -> Option<CacheEntry> {
        self.slots.write().get_mut(key).and_then(|slot| slot.entry.take())
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut slots = self.slots.write();
        for slot in slots.values_mut() {
            slot.entry = None;
        }
        slots.retain(|_, slot| slot.inflight.is_some());
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.entry.is_some())
            .count()
    }

    /// Returns true if no document is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest generation handed out so far, across all keys.
    pub fn latest_generation(&self) -> u64 {
        self.next_generation.load(Ordering::SeqCst)
    }

    /// Returns the metrics recorder.
    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// Builds and installs an entry under the write lock, so generations
    /// are installed in increasing order.
    fn install(&self, key: &ScopeKey, build: impl FnOnce(u64) -> CacheEntry) -> CacheEntry {
        let mut slots = self.slots.write();
        let entry = build(self.bump());
        slots.entry(key.clone()).or_default().entry = Some(entry.clone());
        entry
    }

    fn bump(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}
