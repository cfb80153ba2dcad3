//! Scope key generation.

use settings_core::Scope;
use std::fmt;

/// Key identifying one cached effective-settings document.
///
/// Built from the dimensions of a [`Scope`] that were actually supplied,
/// in the scope's fixed dimension order, so equal scopes always produce
/// equal keys. The canonical form doubles as the query string of the
/// resolution request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    canonical: String,
    pairs: Vec<(&'static str, String)>,
    scope: Scope,
}

impl ScopeKey {
    /// Derives the key for a scope.
    ///
    /// # Examples
    ///
    /// ```
    /// use settings_core::Scope;
    /// use settings_sync::cache::ScopeKey;
    ///
    /// let key = ScopeKey::from_scope(&Scope::new().with_contact_role("buyer").with_account_id("A 1"));
    /// assert_eq!(key.as_str(), "accountId=A%201&contactRole=buyer");
    /// ```
    pub fn from_scope(scope: &Scope) -> Self {
        let pairs: Vec<(&'static str, String)> = scope
            .dimensions()
            .map(|(name, value)| (name, value.to_string()))
            .collect();

        let canonical = pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        Self {
            canonical,
            pairs,
            scope: scope.clone(),
        }
    }

    /// Key for the session-derived scope (no dimensions supplied).
    pub fn session() -> Self {
        Self::from_scope(&Scope::new())
    }

    /// Returns the canonical string.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Returns the query parameters for the resolution request.
    pub fn query_pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Returns the scope this key was derived from.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns true for the session-derived scope.
    pub fn is_session(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl From<&Scope> for ScopeKey {
    fn from(scope: &Scope) -> Self {
        Self::from_scope(scope)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_session() {
            write!(f, "<session>")
        } else {
            write!(f, "{}", self.canonical)
        }
    }
}
