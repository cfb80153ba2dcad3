//! Dot-path editing over a [`SettingsTree`].
//!
//! Paths are split on `.` with no escaping: `"ui.theme"` addresses
//! `{"ui": {"theme": ...}}`. Only [`SettingValue::Object`] nodes are
//! traversable.
//!
//! Two flavours are provided. [`set_path`] and [`unset_path`] are pure and
//! return a new tree, leaving the input untouched. The `_in` variants edit a
//! tree the caller already owns (a working copy).
//!
//! # Silent overwrite
//!
//! When `set` meets an intermediate segment that exists but is not an object
//! (a scalar or an array), that value is replaced by an empty object and the
//! walk continues. Nothing is returned to the caller, but a `warn!` event
//! names the clobbered segment.

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{Result, SettingsError};
use crate::tree::SettingsTree;
use crate::value::SettingValue;

/// Reads the value at `path`, or `None` if any segment is missing or a
/// non-object sits in the way.
pub fn get_path<'a>(tree: &'a SettingsTree, path: &str) -> Option<&'a SettingValue> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = tree.as_inner().get(first)?;

    for segment in segments {
        match current {
            SettingValue::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }

    Some(current)
}

/// Returns a copy of `tree` with `value` stored at `path`.
///
/// # Example
///
/// ```
/// use settings_core::{SettingsTree, path::set_path};
///
/// let before = SettingsTree::from_json(r#"{"ui": {"theme": "light"}}"#).unwrap();
/// let after = set_path(&before, "ui.theme", "dark");
///
/// assert_eq!(after.get("ui.theme").unwrap().as_str(), Some("dark"));
/// assert_eq!(before.get("ui.theme").unwrap().as_str(), Some("light"));
/// ```
pub fn set_path(tree: &SettingsTree, path: &str, value: impl Into<SettingValue>) -> SettingsTree {
    let mut next = tree.clone();
    set_path_in(&mut next, path, value.into());
    next
}

/// Returns a copy of `tree` with the key at `path` removed.
///
/// A path that does not resolve leaves the copy identical to the input.
pub fn unset_path(tree: &SettingsTree, path: &str) -> SettingsTree {
    let mut next = tree.clone();
    unset_path_in(&mut next, path);
    next
}

/// Stores `value` at `path` inside `tree`, creating intermediate objects.
pub fn set_path_in(tree: &mut SettingsTree, path: &str, value: SettingValue) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut node: &mut IndexMap<String, SettingValue> = tree.as_inner_mut();
    for segment in parents {
        let child = node
            .entry((*segment).to_string())
            .or_insert_with(SettingValue::empty_object);

        if !child.is_object() {
            warn!(
                path = %path,
                segment = %segment,
                previous = child.kind(),
                "Overwriting non-object intermediate with an empty object"
            );
            *child = SettingValue::empty_object();
        }

        let SettingValue::Object(map) = child else {
            return;
        };
        node = map;
    }

    node.insert((*last).to_string(), value);
}

/// Removes the key at `path` from `tree`, returning the removed value.
///
/// Missing or non-traversable segments make this a no-op returning `None`.
/// Sibling order is preserved.
pub fn unset_path_in(tree: &mut SettingsTree, path: &str) -> Option<SettingValue> {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = segments.split_last()?;

    let mut node: &mut IndexMap<String, SettingValue> = tree.as_inner_mut();
    for segment in parents {
        match node.get_mut(*segment) {
            Some(SettingValue::Object(map)) => node = map,
            _ => return None,
        }
    }

    node.shift_remove(*last)
}

/// Rejects paths the server could never address: empty paths and paths
/// with an empty segment (`"ui..theme"`, `".ui"`, `"ui."`).
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SettingsError::invalid_path(path, "path cannot be empty"));
    }
    if path.split('.').any(str::is_empty) {
        return Err(SettingsError::invalid_path(path, "path contains an empty segment"));
    }
    Ok(())
}
