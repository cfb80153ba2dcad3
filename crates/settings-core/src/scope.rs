//! Request scope for effective-settings resolution.

use serde::{Deserialize, Serialize};

/// The dimensions that select which effective-settings document is wanted.
///
/// Every dimension is optional; the server resolves absent ones from the
/// session. The engine never interprets these values, it only uses them to
/// build a cache key and query parameters.
///
/// # Example
///
/// ```
/// use settings_core::Scope;
///
/// let scope = Scope::new().with_account_id("acc-42").with_contact_role("buyer");
/// assert_eq!(scope.account_id(), Some("acc-42"));
/// assert_eq!(scope.dimensions().count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    territory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contact_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl Scope {
    /// Creates an empty scope (everything resolved from the session).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant_id(mut self, value: impl Into<String>) -> Self {
        self.tenant_id = Some(value.into());
        self
    }

    pub fn with_territory(mut self, value: impl Into<String>) -> Self {
        self.territory = Some(value.into());
        self
    }

    pub fn with_account_id(mut self, value: impl Into<String>) -> Self {
        self.account_id = Some(value.into());
        self
    }

    pub fn with_contact_role(mut self, value: impl Into<String>) -> Self {
        self.contact_role = Some(value.into());
        self
    }

    pub fn with_contact_id(mut self, value: impl Into<String>) -> Self {
        self.contact_id = Some(value.into());
        self
    }

    pub fn with_user_id(mut self, value: impl Into<String>) -> Self {
        self.user_id = Some(value.into());
        self
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn territory(&self) -> Option<&str> {
        self.territory.as_deref()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn contact_role(&self) -> Option<&str> {
        self.contact_role.as_deref()
    }

    pub fn contact_id(&self) -> Option<&str> {
        self.contact_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Returns true if no dimension is supplied.
    pub fn is_empty(&self) -> bool {
        self.dimensions().next().is_none()
    }

    /// Iterates the supplied dimensions as `(wire name, value)` pairs in a
    /// fixed order: tenantId, territory, accountId, contactRole, contactId,
    /// userId.
    pub fn dimensions(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("tenantId", self.tenant_id.as_deref()),
            ("territory", self.territory.as_deref()),
            ("accountId", self.account_id.as_deref()),
            ("contactRole", self.contact_role.as_deref()),
            ("contactId", self.contact_id.as_deref()),
            ("userId", self.user_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }
}
