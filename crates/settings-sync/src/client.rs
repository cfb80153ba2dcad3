//! High-level settings client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use settings_core::{
    EffectiveDocument, NotificationSettings, PatchOp, Scope, SettingValue, UiSettings,
};
use tracing::debug;

use crate::cache::{CacheStore, DocumentResult, ScopeKey};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::metrics::SyncMetrics;
use crate::mutation::{MutationEngine, MutationPhase};
use crate::retry::RetryPolicy;
use crate::revalidate::RevalidationClient;
use crate::transport::{HttpTransport, SettingsTransport};

/// Reads and edits effective settings for any number of scopes.
///
/// Reads are served from the cache while the entry is younger than the
/// configured freshness window and revalidated with retry otherwise. Edits
/// go through the [`MutationEngine`].
///
/// # Examples
///
/// ```no_run
/// use settings_core::{Scope, Theme};
/// use settings_sync::{SettingsClient, SyncConfig};
///
/// # async fn run() -> Result<(), settings_sync::SyncError> {
/// let client = SettingsClient::new(SyncConfig::default())?;
/// let scope = Scope::new().with_account_id("acc-1");
///
/// client.update_setting(&scope, "ui.theme", "dark").await?;
/// assert_eq!(client.ui_settings(&scope).await?.theme, Theme::Dark);
/// # Ok(())
/// # }
/// ```
pub struct SettingsClient {
    config: SyncConfig,
    store: Arc<CacheStore>,
    revalidator: RevalidationClient,
    engine: MutationEngine,
    retry: RetryPolicy,
}

impl SettingsClient {
    /// Creates a client talking HTTP to `config.base_url`.
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        let metrics = SyncMetrics::new();
        let transport = HttpTransport::new(&config)?.with_metrics(metrics.clone());
        Ok(Self::build(config, Arc::new(transport), metrics))
    }

    /// Creates a client over any transport.
    pub fn with_transport(config: SyncConfig, transport: Arc<dyn SettingsTransport>) -> Self {
        Self::build(config, transport, SyncMetrics::new())
    }

    fn build(config: SyncConfig, transport: Arc<dyn SettingsTransport>, metrics: SyncMetrics) -> Self {
        let store = Arc::new(CacheStore::new(metrics));
        let revalidator = RevalidationClient::new(transport, Arc::clone(&store));
        let engine = MutationEngine::new(revalidator.clone())
            .with_reconciliation(config.reconcile_after_mutation());
        let retry = RetryPolicy::new(config.retry().clone());

        Self {
            config,
            store,
            revalidator,
            engine,
            retry,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn metrics(&self) -> &SyncMetrics {
        self.store.metrics()
    }

    pub fn engine(&self) -> &MutationEngine {
        &self.engine
    }

    pub fn revalidator(&self) -> &RevalidationClient {
        &self.revalidator
    }

    /// Returns the effective document for `scope`.
    ///
    /// A fresh or optimistic entry is returned without a request.
    pub async fn get(&self, scope: &Scope) -> DocumentResult {
        let key = ScopeKey::from_scope(scope);

        if let Some(entry) = self.store.get(&key)
            && (entry.is_provisional() || entry.is_fresh(self.config.stale_after()))
        {
            self.metrics().record_hit();
            debug!(key = %key, age = ?entry.age(), "Serving cached document");
            return Ok(Arc::clone(entry.document()));
        }

        self.metrics().record_miss();
        self.revalidate(&key).await
    }

    /// Revalidates `scope` regardless of freshness.
    pub async fn refresh(&self, scope: &Scope) -> DocumentResult {
        self.revalidate(&ScopeKey::from_scope(scope)).await
    }

    /// Returns the cached document without any request.
    pub fn cached(&self, scope: &Scope) -> Option<Arc<EffectiveDocument>> {
        self.store
            .get(&ScopeKey::from_scope(scope))
            .map(|entry| Arc::clone(entry.document()))
    }

    /// Applies a patch batch to `scope`.
    pub async fn apply(&self, scope: &Scope, ops: &[PatchOp]) -> DocumentResult {
        self.engine.apply(&ScopeKey::from_scope(scope), ops).await
    }

    /// Sets one dot-path key.
    pub async fn update_setting(
        &self,
        scope: &Scope,
        key: &str,
        value: impl Into<SettingValue>,
    ) -> DocumentResult {
        self.apply(scope, &[PatchOp::set(key, value)]).await
    }

    /// Removes one dot-path key.
    pub async fn remove_setting(&self, scope: &Scope, key: &str) -> DocumentResult {
        self.apply(scope, &[PatchOp::unset(key)]).await
    }

    /// Reads a single value.
    pub async fn setting(&self, scope: &Scope, path: &str) -> Result<Option<SettingValue>, SyncError> {
        let document = self.get(scope).await?;
        Ok(document.blob().get(path).cloned())
    }

    /// Reads a section into a typed value.
    pub async fn section<T: DeserializeOwned>(
        &self,
        scope: &Scope,
        path: &str,
    ) -> Result<Option<T>, SyncError> {
        let document = self.get(scope).await?;
        Ok(document.blob().section(path)?)
    }

    /// Reads the `ui` section.
    pub async fn ui_settings(&self, scope: &Scope) -> Result<UiSettings, SyncError> {
        let document = self.get(scope).await?;
        Ok(UiSettings::from_tree(document.blob())?)
    }

    /// Reads the `notifications` section.
    pub async fn notification_settings(&self, scope: &Scope) -> Result<NotificationSettings, SyncError> {
        let document = self.get(scope).await?;
        Ok(NotificationSettings::from_tree(document.blob())?)
    }

    /// Returns the phase of the latest batch for `scope`.
    pub fn phase(&self, scope: &Scope) -> MutationPhase {
        self.engine.phase(&ScopeKey::from_scope(scope))
    }

    /// Drops every cached document and mutation state, e.g. on logout.
    pub fn clear(&self) {
        self.store.clear();
        self.engine.states().reset();
    }

    async fn revalidate(&self, key: &ScopeKey) -> DocumentResult {
        self.retry
            .run("revalidate", || self.revalidator.revalidate(key))
            .await
    }
}
