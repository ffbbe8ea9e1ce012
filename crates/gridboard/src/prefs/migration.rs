//! Legacy storage migration.
//!
//! Schema v1 kept the dashboard layout and presets as a flat object in a
//! standalone `layout.json` file. Schema v2 namespaces everything under
//! dot-notation keys in a single preference document. Migration folds
//! any v1 data it finds into the document and stamps the schema version
//! so it runs at most once per account, even across sessions.

use serde_json::Value;

use crate::prefs::{keys, Document};

/// Current preference document schema version.
pub const CURRENT_SCHEMA_VERSION: u64 = 2;

/// Reads the schema version of a document. Documents written before
/// versioning existed count as v1.
pub fn schema_version(doc: &Document) -> u64 {
    doc.get(keys::SCHEMA_VERSION)
        .and_then(Value::as_u64)
        .unwrap_or(1)
}

/// Folds a legacy v1 value into the document and stamps the schema
/// version. Returns `true` when the document changed.
///
/// Legacy data never overwrites data already present under the new
/// keys; a half-migrated document keeps whatever the new keys hold.
pub fn fold_legacy(doc: &mut Document, legacy: Option<&Value>) -> bool {
    if schema_version(doc) >= CURRENT_SCHEMA_VERSION {
        return false;
    }

    if let Some(legacy) = legacy {
        if !doc.contains(keys::LAYOUT) {
            if let Some(layout) = legacy.get("layout") {
                tracing::info!("migrating legacy dashboard layout");
                doc.set(keys::LAYOUT, layout.clone());
            }
        }
        if !doc.contains(keys::PRESETS) {
            if let Some(presets) = legacy.get("presets") {
                tracing::info!("migrating legacy dashboard presets");
                doc.set(keys::PRESETS, presets.clone());
            }
        }
    }

    doc.set(keys::SCHEMA_VERSION, CURRENT_SCHEMA_VERSION.into());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_document_counts_as_v1() {
        assert_eq!(schema_version(&Document::new()), 1);
    }

    #[test]
    fn fold_stamps_version_even_without_legacy_data() {
        let mut doc = Document::new();
        assert!(fold_legacy(&mut doc, None));
        assert_eq!(schema_version(&doc), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn fold_moves_legacy_layout_and_presets() {
        let mut doc = Document::new();
        let legacy = json!({
            "layout": [{"id": "clock", "enabled": true}],
            "presets": [null, null],
        });
        assert!(fold_legacy(&mut doc, Some(&legacy)));
        assert_eq!(
            doc.get(keys::LAYOUT),
            Some(&json!([{"id": "clock", "enabled": true}]))
        );
        assert_eq!(doc.get(keys::PRESETS), Some(&json!([null, null])));
    }

    #[test]
    fn fold_never_overwrites_new_keys() {
        let mut doc = Document::new();
        doc.set(keys::LAYOUT, json!([{"id": "market-prices"}]));
        let legacy = json!({"layout": [{"id": "clock"}]});
        fold_legacy(&mut doc, Some(&legacy));
        assert_eq!(doc.get(keys::LAYOUT), Some(&json!([{"id": "market-prices"}])));
    }

    #[test]
    fn fold_is_idempotent() {
        let mut doc = Document::new();
        assert!(fold_legacy(&mut doc, None));
        assert!(!fold_legacy(&mut doc, None));
        assert!(!fold_legacy(&mut doc, Some(&json!({"layout": []}))));
    }
}
