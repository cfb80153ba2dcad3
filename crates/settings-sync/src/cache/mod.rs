//! Scope-keyed document cache.

mod keys;
mod store;

pub use keys::ScopeKey;
pub use store::{CacheEntry, CacheStore, DocumentResult, Install};
