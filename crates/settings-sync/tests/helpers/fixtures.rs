//! Documents, scopes and clients used across tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use settings_core::{EffectiveDocument, Scope, SettingsTree};
use settings_sync::{RetryConfig, ScopeKey, SettingsClient, SyncConfig};

use super::MockTransport;

/// Builds a document from JSON with `computedAt` = 2025-09-01T10:<minute>:00Z.
pub fn document(json: &str, etag: &str, minute: u32) -> EffectiveDocument {
    let blob = SettingsTree::from_json(json).unwrap();
    let computed_at = Utc.with_ymd_and_hms(2025, 9, 1, 10, minute, 0).unwrap();
    EffectiveDocument::new(blob, etag, computed_at)
}

/// `{ui: {theme: "light"}}` at etag `e1`.
pub fn light_document() -> EffectiveDocument {
    document(r#"{"ui": {"theme": "light"}}"#, "e1", 0)
}

/// `{ui: {theme: "dark"}}` at etag `e2`.
pub fn dark_document() -> EffectiveDocument {
    document(r#"{"ui": {"theme": "dark"}}"#, "e2", 1)
}

pub fn account_scope() -> Scope {
    Scope::new().with_account_id("acc-1").with_contact_role("buyer")
}

pub fn other_scope() -> Scope {
    Scope::new().with_account_id("acc-2")
}

pub fn key_of(scope: &Scope) -> ScopeKey {
    ScopeKey::from_scope(scope)
}

/// Config with reconciliation off and fast retries, so call counts in
/// tests are deterministic.
pub fn quiet_config() -> SyncConfig {
    SyncConfig::builder()
        .reconcile_after_mutation(false)
        .retry(RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            multiplier: 2.0,
            max_delay: Duration::from_millis(50),
        })
        .build()
        .unwrap()
}

pub fn client_with(transport: &Arc<MockTransport>, config: SyncConfig) -> Arc<SettingsClient> {
    Arc::new(SettingsClient::with_transport(config, transport.clone()))
}

/// Client whose cache already holds `doc` for `scope`.
pub fn seeded_client(
    transport: &Arc<MockTransport>,
    scope: &Scope,
    doc: EffectiveDocument,
) -> Arc<SettingsClient> {
    let client = client_with(transport, quiet_config());
    client.store().put(&key_of(scope), doc);
    client
}
