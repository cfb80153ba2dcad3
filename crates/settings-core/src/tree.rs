use crate::error::{Result, SettingsError};
use crate::path;
use crate::value::SettingValue;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The root of an effective-settings document (the `blob`).
///
/// Wraps an `IndexMap<String, SettingValue>` and adds dot-notation reads,
/// typed section reads and JSON/YAML conversion. Writes by path live in
/// [`crate::path`] so that copy-on-write and in-place variants share one
/// traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SettingsTree {
    inner: IndexMap<String, SettingValue>,
}

impl SettingsTree {
    /// Creates a new empty tree.
    pub fn new() -> Self {
        Self {
            inner: IndexMap::new(),
        }
    }

    /// Creates a tree from an existing IndexMap.
    pub fn from_inner(inner: IndexMap<String, SettingValue>) -> Self {
        Self { inner }
    }

    /// Returns a reference to the internal map.
    pub fn as_inner(&self) -> &IndexMap<String, SettingValue> {
        &self.inner
    }

    /// Returns a mutable reference to the internal map.
    pub fn as_inner_mut(&mut self) -> &mut IndexMap<String, SettingValue> {
        &mut self.inner
    }

    /// Returns true if the tree has no top-level keys.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of top-level keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Inserts a top-level key-value pair.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Retrieves a value by dot-path.
    ///
    /// # Example
    /// ```
    /// # use settings_core::SettingsTree;
    /// let tree = SettingsTree::from_json(r#"{"ui": {"theme": "dark"}}"#).unwrap();
    /// assert_eq!(tree.get("ui.theme").and_then(|v| v.as_str()), Some("dark"));
    /// assert!(tree.get("ui.theme.color").is_none());
    /// ```
    pub fn get(&self, path: &str) -> Option<&SettingValue> {
        path::get_path(self, path)
    }

    /// Returns true if the dot-path resolves to a value.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Deserializes the value at `path` into a typed section.
    ///
    /// Returns `Ok(None)` when the path does not resolve.
    pub fn section<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let Some(value) = self.get(path) else {
            return Ok(None);
        };

        let json = serde_json::to_value(value)
            .map_err(|e| SettingsError::section_mismatch(path, e.to_string()))?;
        serde_json::from_value(json)
            .map(Some)
            .map_err(|e| SettingsError::section_mismatch(path, e.to_string()))
    }

    /// Parses a JSON object into a tree.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SettingsError::parse_error_with_cause("json_source", e.to_string(), e))
    }

    /// Serializes the tree to a JSON string (pretty printed).
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SettingsError::parse_error("json_target", e.to_string()))
    }

    /// Serializes the tree to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| SettingsError::parse_error("yaml_target", e.to_string()))
    }
}

impl From<IndexMap<String, SettingValue>> for SettingsTree {
    fn from(map: IndexMap<String, SettingValue>) -> Self {
        SettingsTree { inner: map }
    }
}
