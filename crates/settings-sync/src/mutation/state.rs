//! Per-scope mutation phase tracking.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use parking_lot::RwLock;

use crate::cache::ScopeKey;

/// Where a scope's latest `apply` is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationPhase {
    /// Nothing has been applied yet.
    #[default]
    Idle,
    /// An optimistic blob is visible and the patch is in flight.
    Optimistic,
    /// The server accepted the last batch.
    Committed,
    /// The server refused the last batch; the snapshot was restored.
    RolledBack,
}

impl MutationPhase {
    /// Returns true while a batch is awaiting the server.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Optimistic)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Optimistic => "optimistic",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for MutationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one scope's mutation state.
#[derive(Debug, Clone)]
pub struct MutationStatus {
    pub phase: MutationPhase,
    pub last_error: Option<String>,
    pub updated_at: Instant,
}

/// Tracks the mutation phase of every scope that has seen an `apply`.
#[derive(Debug, Default)]
pub struct MutationStates {
    states: RwLock<HashMap<ScopeKey, MutationStatus>>,
}

impl MutationStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase, `Idle` for unknown scopes.
    pub fn phase(&self, key: &ScopeKey) -> MutationPhase {
        self.states
            .read()
            .get(key)
            .map(|status| status.phase)
            .unwrap_or_default()
    }

    /// Returns the full status of a scope.
    pub fn status(&self, key: &ScopeKey) -> Option<MutationStatus> {
        self.states.read().get(key).cloned()
    }

    /// Returns the error that caused the last rollback.
    pub fn last_error(&self, key: &ScopeKey) -> Option<String> {
        self.states
            .read()
            .get(key)
            .and_then(|status| status.last_error.clone())
    }

    /// Records entry into the optimistic phase.
    pub fn record_optimistic(&self, key: &ScopeKey) {
        self.set(key, MutationPhase::Optimistic, None);
    }

    /// Records a committed batch.
    pub fn record_commit(&self, key: &ScopeKey) {
        self.set(key, MutationPhase::Committed, None);
    }

    /// Records a rolled-back batch.
    pub fn record_rollback(&self, key: &ScopeKey, error: impl Into<String>) {
        self.set(key, MutationPhase::RolledBack, Some(error.into()));
    }

    /// Forgets all scopes.
    pub fn reset(&self) {
        self.states.write().clear();
    }

    fn set(&self, key: &ScopeKey, phase: MutationPhase, last_error: Option<String>) {
        self.states.write().insert(
            key.clone(),
            MutationStatus {
                phase,
                last_error,
                updated_at: Instant::now(),
            },
        );
    }
}
