//! Settings Core - Domain types for effective settings
//!
//! This crate provides the foundational, I/O-free types used by the
//! settings synchronization engine:
//!
//! - [`SettingValue`] and [`SettingsTree`]: a typed JSON document model
//! - [`path`]: dot-path read/write/remove over a settings tree
//! - [`EffectiveDocument`] and [`Etag`]: the server-computed document
//! - [`Scope`] and [`PatchOp`]: request scoping and patch batches
//! - [`sections`]: typed views over well-known sections of the document

pub mod document;
pub mod error;
pub mod patch;
pub mod path;
pub mod scope;
pub mod sections;
pub mod tree;
pub mod value;

pub use document::{EffectiveDocument, Etag};
pub use error::{Result, SettingsError};
pub use patch::{PatchOp, apply_ops};
pub use scope::Scope;
pub use sections::{NotificationChannels, NotificationSettings, Theme, UiSettings};
pub use tree::SettingsTree;
pub use value::SettingValue;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
