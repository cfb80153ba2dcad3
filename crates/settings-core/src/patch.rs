//! Patch operations against an effective-settings document.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::{self, validate_path};
use crate::scope::Scope;
use crate::tree::SettingsTree;
use crate::value::SettingValue;

/// One instruction in a patch batch.
///
/// Serialized as `{"op": "set", "key": "ui.theme", "value": "dark"}` or
/// `{"op": "unset", "key": "ui.theme"}`, with an optional `scope` that
/// overrides the batch scope for that single operation. A `value` sent with
/// `unset` is ignored.
///
/// # Example
///
/// ```
/// use settings_core::{PatchOp, SettingsTree, apply_ops};
///
/// let ops = vec![PatchOp::set("a.b", 1), PatchOp::set("a.b", 2)];
/// let tree = apply_ops(&SettingsTree::new(), &ops);
/// assert_eq!(tree.get("a.b").unwrap().as_i64(), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Set {
        key: String,
        value: SettingValue,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<Scope>,
    },
    Unset {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<Scope>,
    },
}

impl PatchOp {
    /// Creates a `set` operation.
    pub fn set(key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            scope: None,
        }
    }

    /// Creates an `unset` operation.
    pub fn unset(key: impl Into<String>) -> Self {
        Self::Unset {
            key: key.into(),
            scope: None,
        }
    }

    /// Returns the operation with a per-operation scope override.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        match &mut self {
            Self::Set { scope: slot, .. } | Self::Unset { scope: slot, .. } => {
                *slot = Some(scope);
            },
        }
        self
    }

    /// Returns the operation scoped to `scope` unless it already carries an
    /// override. An empty `scope` leaves the operation untouched.
    pub fn or_scope(self, scope: &Scope) -> Self {
        if self.scope().is_some() || scope.is_empty() {
            self
        } else {
            self.with_scope(scope.clone())
        }
    }

    /// Returns the dot-path this operation targets.
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Unset { key, .. } => key,
        }
    }

    /// Returns the per-operation scope override, if any.
    pub fn scope(&self) -> Option<&Scope> {
        match self {
            Self::Set { scope, .. } | Self::Unset { scope, .. } => scope.as_ref(),
        }
    }

    /// Wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Unset { .. } => "unset",
        }
    }

    /// Checks that the key is a well-formed dot-path.
    pub fn validate(&self) -> Result<()> {
        validate_path(self.key())
    }

    /// Applies this operation to a working tree in place.
    pub fn apply_in(&self, tree: &mut SettingsTree) {
        match self {
            Self::Set { key, value, .. } => path::set_path_in(tree, key, value.clone()),
            Self::Unset { key, .. } => {
                path::unset_path_in(tree, key);
            },
        }
    }
}

/// Applies a batch in array order to a copy of `tree`.
///
/// Later operations on the same key win. The input is not modified.
pub fn apply_ops(tree: &SettingsTree, ops: &[PatchOp]) -> SettingsTree {
    let mut working = tree.clone();
    for op in ops {
        op.apply_in(&mut working);
    }
    working
}
