//! Rendering of documents and values.

use anyhow::Result;
use serde::Serialize;

use crate::cli::Format;

/// Renders any serializable value in the requested format.
pub fn render<T: Serialize + ?Sized>(value: &T, format: Format) -> Result<String> {
    let text = match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(text.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use settings_core::SettingsTree;

    #[test]
    fn test_render_formats() {
        let tree = SettingsTree::from_json(r#"{"ui": {"theme": "dark"}}"#).unwrap();

        assert_eq!(
            render(&tree, Format::Json).unwrap(),
            "{\n  \"ui\": {\n    \"theme\": \"dark\"\n  }\n}"
        );
        assert_eq!(render(&tree, Format::Yaml).unwrap(), "ui:\n  theme: dark");
    }
}
