//! JSON bodies exchanged with the settings server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use settings_core::{EffectiveDocument, SettingsTree};

use crate::error::SyncError;

/// Body of a `200` from either endpoint: `{ blob, etag, computedAt }`.
///
/// Some deployments send the version only in the `ETag` header, so the body
/// field is optional here and the header fills the gap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    pub blob: SettingsTree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub computed_at: DateTime<Utc>,
}

impl DocumentPayload {
    /// Builds the document, preferring the body ETag over the header one.
    pub fn into_document(self, header_etag: Option<&str>) -> Result<EffectiveDocument, SyncError> {
        let etag = self
            .etag
            .or_else(|| header_etag.map(str::to_string))
            .ok_or_else(|| SyncError::invalid_response("response carries no etag"))?;

        Ok(EffectiveDocument::new(self.blob, etag, self.computed_at))
    }
}
