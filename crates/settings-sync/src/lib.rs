//! # Settings Sync
//!
//! ETag-revalidated cache and optimistic mutation engine for effective
//! settings documents.
//!
//! ## Features
//!
//! - One cached document per scope, revalidated with `If-None-Match`
//! - Concurrent revalidations of a scope coalesced into one request
//! - Late revalidation results never overwrite a newer write
//! - Patch batches applied optimistically, committed or rolled back exactly
//! - Per-scope serialization of mutations, background reconciliation
//!
//! ## Example
//!
//! ```ignore
//! use settings_core::{PatchOp, Scope};
//! use settings_sync::{SettingsClient, SyncConfig};
//!
//! let config = SyncConfig::builder()
//!     .base_url("https://crm.example.com/api")
//!     .auth_token(token)
//!     .build()?;
//! let client = SettingsClient::new(config)?;
//!
//! let scope = Scope::new().with_account_id("acc-1");
//! let doc = client.get(&scope).await?;
//! client.apply(&scope, &[PatchOp::set("ui.theme", "dark")]).await?;
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod mutation;
pub mod retry;
pub mod revalidate;
pub mod transport;

// Re-exports
pub use crate::auth::{NoAuth, StaticToken, TokenProvider};
pub use crate::cache::{CacheEntry, CacheStore, ScopeKey};
pub use crate::client::SettingsClient;
pub use crate::config::{LoadError, RetryConfig, SyncConfig};
pub use crate::error::{MutationError, Problem, SyncError};
pub use crate::metrics::{SyncMetrics, register_metrics};
pub use crate::mutation::{MutationEngine, MutationPhase};
pub use crate::retry::RetryPolicy;
pub use crate::revalidate::RevalidationClient;
pub use crate::transport::{FetchOutcome, HttpTransport, SettingsTransport};

// Re-export settings_core for consumers
pub use settings_core;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
