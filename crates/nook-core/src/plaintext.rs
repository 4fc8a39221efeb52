//! Plain-text projection of stored note content
//!
//! List rows show a flat preview of a note without spinning up an editing
//! session. The projection walks the serialized JSON directly (not the
//! typed model) so that notes written before the structured editor, which
//! stored bare text, still project: if the content does not parse as JSON
//! it is returned unchanged. That fallback is deliberate legacy behavior,
//! scoped to this function only.

use serde_json::Value;

/// Flatten serialized note content into a preview string.
///
/// Total: returns a string for every input, including `None`, blank
/// content, and malformed JSON. A node contributes its own `text` field if
/// it has one; otherwise the comma-joined projection of its children;
/// otherwise nothing. Nested structure flattens into comma-separated
/// fragments, an accepted lossy degradation for list rows.
pub fn extract_plain_text(content: Option<&str>) -> String {
    let Some(content) = content else {
        return String::new();
    };
    if content.trim().is_empty() {
        return String::new();
    }

    match serde_json::from_str::<Value>(content) {
        Ok(value) => match value.get("root") {
            Some(root) => project(root),
            // No root node: treat as a pre-structured plain-text note
            None => content.to_string(),
        },
        Err(_) => content.to_string(),
    }
}

fn project(node: &Value) -> String {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        return text.to_string();
    }
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        return children
            .iter()
            .map(project)
            .collect::<Vec<_>>()
            .join(", ");
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projects_paragraphs() {
        let content = r#"{"root":{"children":[{"children":[{"text":"Hello"}]},{"children":[{"text":"World"}]}]}}"#;
        assert_eq!(extract_plain_text(Some(content)), "Hello, World");
    }

    #[test]
    fn test_total_over_bad_input() {
        assert_eq!(extract_plain_text(None), "");
        assert_eq!(extract_plain_text(Some("")), "");
        assert_eq!(extract_plain_text(Some("   ")), "");
        assert_eq!(extract_plain_text(Some("{not json")), "{not json");
        assert_eq!(
            extract_plain_text(Some("a plain legacy note")),
            "a plain legacy note"
        );
        // Valid JSON without a root node falls back the same way
        assert_eq!(extract_plain_text(Some(r#"{"a":1}"#)), r#"{"a":1}"#);
    }

    #[test]
    fn test_nested_structure_flattens() {
        let content = r#"{"root":{"children":[
            {"children":[{"text":"intro"}]},
            {"children":[
                {"children":[{"text":"one"}]},
                {"children":[{"text":"two"}]}
            ]}
        ]}}"#;
        assert_eq!(extract_plain_text(Some(content)), "intro, one, two");
    }

    #[test]
    fn test_leaf_without_text_or_children() {
        let content = r#"{"root":{"children":[{"children":[{"text":"a"},{}]}]}}"#;
        assert_eq!(extract_plain_text(Some(content)), "a, ");
    }

    #[test]
    fn test_non_string_text_field_ignored() {
        let content = r#"{"root":{"children":[{"text":42,"children":[{"text":"real"}]}]}}"#;
        assert_eq!(extract_plain_text(Some(content)), "real");
    }

    #[test]
    fn test_projects_real_document() {
        let doc = crate::document::Document::empty();
        let json = doc.to_json_string().unwrap();
        assert_eq!(extract_plain_text(Some(&json)), "");
    }
}
