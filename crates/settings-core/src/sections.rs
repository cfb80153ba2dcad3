//! Typed views over well-known sections of the effective document.
//!
//! The blob is schemaless, but a few sections are read by every settings
//! screen. These types deserialize them leniently: unknown fields are
//! ignored and missing ones fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tree::SettingsTree;

/// Color theme stored at `ui.theme`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// The `ui` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub theme: Theme,
}

impl UiSettings {
    pub const PATH: &'static str = "ui";

    /// Reads the section from a tree; absent section yields defaults.
    pub fn from_tree(tree: &SettingsTree) -> Result<Self> {
        Ok(tree.section(Self::PATH)?.unwrap_or_default())
    }
}

/// Delivery channels under `notifications.channels`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationChannels {
    pub email: bool,
    pub phone: bool,
    pub sms: bool,
}

/// The `notifications` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub channels: NotificationChannels,
}

impl NotificationSettings {
    pub const PATH: &'static str = "notifications";

    /// Reads the section from a tree; absent section yields defaults.
    pub fn from_tree(tree: &SettingsTree) -> Result<Self> {
        Ok(tree.section(Self::PATH)?.unwrap_or_default())
    }
}
