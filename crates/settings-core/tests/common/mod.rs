#![allow(dead_code)]
use chrono::{TimeZone, Utc};
use settings_core::{EffectiveDocument, SettingsTree};

/// Helper to create a SettingsTree from a JSON string slice.
/// Panics if the JSON is invalid (intended for tests).
pub fn tree_from_json(json: &str) -> SettingsTree {
    SettingsTree::from_json(json).expect("Failed to create test tree from JSON")
}

/// Builds a document with a fixed timestamp.
pub fn document(json: &str, etag: &str) -> EffectiveDocument {
    let computed_at = Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap();
    EffectiveDocument::new(tree_from_json(json), etag, computed_at)
}

/// Returns a nested settings fixture resembling a real user document.
pub fn user_settings() -> SettingsTree {
    tree_from_json(
        r#"{
        "ui": {
            "theme": "light",
            "density": "comfortable"
        },
        "notifications": {
            "channels": {
                "email": true,
                "phone": false,
                "sms": false
            },
            "quietHours": [22, 7]
        },
        "sla": {
            "firstResponseHours": 24
        }
    }"#,
    )
}
