//! Local write-path tests: commits, toggles, instances, presets,
//! geometry, and permission healing.

use serde_json::Value;

use super::{drain_events, enabled_ids, ready_engine};
use crate::permissions::WidgetPermissions;
use crate::prefs::{keys, PreferenceStore};
use crate::presets::PresetError;
use crate::sync::EngineEvent;
use crate::{LayoutMeta, PresetType, SourceTag, StoredWidget};

fn active(id: &str, x: u32, y: u32) -> StoredWidget {
    StoredWidget {
        id: id.to_string(),
        x: Some(x),
        y: Some(y),
        w: Some(2),
        h: Some(2),
        enabled: Some(true),
    }
}

async fn stored_meta(store: &PreferenceStore) -> LayoutMeta {
    let value = store
        .snapshot()
        .await
        .get(keys::LAYOUT_META)
        .cloned()
        .expect("layout meta present");
    serde_json::from_value(value).expect("meta parses")
}

#[tokio::test]
async fn commit_merges_and_writes_with_source_tag() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;
    engine.set_widget_enabled("alpha", true).await;
    engine.set_widget_enabled("bravo", true).await;

    // The drag surface reports only alpha; bravo fell off the grid.
    engine
        .commit_active_layout(&[active("alpha", 6, 2)], SourceTag::LocalInteraction)
        .await;

    assert_eq!(enabled_ids(&engine), vec!["alpha"]);
    let alpha = engine
        .layout()
        .iter()
        .find(|w| w.id == "alpha")
        .expect("alpha");
    assert_eq!((alpha.x, alpha.y), (6, 2));

    let meta = stored_meta(&store).await;
    assert_eq!(meta.source, SourceTag::LocalInteraction);
    assert_eq!(meta.session, engine.session().id());
}

#[tokio::test]
async fn toggles_carry_add_and_remove_tags() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;

    assert!(engine.set_widget_enabled("alpha", true).await);
    assert_eq!(stored_meta(&store).await.source, SourceTag::WidgetAdd);

    assert!(engine.set_widget_enabled("alpha", false).await);
    assert_eq!(stored_meta(&store).await.source, SourceTag::WidgetRemove);
}

#[tokio::test]
async fn toggle_of_unknown_widget_is_rejected() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;
    assert!(!engine.set_widget_enabled("ghost", true).await);
}

#[tokio::test]
async fn instances_allocate_smallest_free_id_up_to_cap() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;

    assert_eq!(
        engine.add_widget_instance("panel").await,
        Some("panel:1".to_string())
    );
    assert_eq!(
        engine.add_widget_instance("panel").await,
        Some("panel:2".to_string())
    );
    // The test catalog caps panel at two instances.
    assert_eq!(engine.add_widget_instance("panel").await, None);

    assert!(engine.remove_widget_instance("panel:1").await);
    assert_eq!(
        engine.add_widget_instance("panel").await,
        Some("panel:1".to_string())
    );
}

#[tokio::test]
async fn singleton_types_never_get_instances() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;
    assert_eq!(engine.add_widget_instance("alpha").await, None);
    assert_eq!(engine.add_widget_instance("ghost").await, None);
    assert!(!engine.remove_widget_instance("alpha").await);
}

#[tokio::test]
async fn load_preset_of_empty_slot_is_rejected_without_mutation() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;
    engine.set_widget_enabled("alpha", true).await;
    let mut events = engine.subscribe();
    let before = engine.layout().to_vec();

    let err = engine.load_preset(2).await.expect_err("slot 2 is empty");
    assert_eq!(err, PresetError::EmptySlot(2));
    assert_eq!(engine.layout(), &before[..]);
    assert_eq!(engine.active_preset(), None);
    assert!(drain_events(&mut events)
        .iter()
        .any(|e| matches!(e, EngineEvent::PresetRejected { index: 2 })));
}

#[tokio::test]
async fn load_preset_activates_slot_and_tags_write() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;
    engine.set_widget_enabled("bravo", true).await;
    engine
        .save_preset(4, PresetType::Grid)
        .await
        .expect("save preset");

    engine.set_widget_enabled("bravo", false).await;
    engine.load_preset(4).await.expect("load preset");

    assert_eq!(engine.active_preset(), Some(4));
    assert_eq!(enabled_ids(&engine), vec!["bravo"]);
    assert_eq!(stored_meta(&store).await.source, SourceTag::PresetLoad);
}

#[tokio::test]
async fn edits_flow_into_the_active_preset_slot() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;
    engine.set_widget_enabled("alpha", true).await;
    engine
        .save_preset(1, PresetType::Grid)
        .await
        .expect("save preset");
    engine.load_preset(1).await.expect("load preset");

    engine
        .commit_active_layout(&[active("alpha", 9, 1)], SourceTag::LocalInteraction)
        .await;

    let slot = engine.presets().get(1).expect("occupied");
    let alpha = slot
        .layout
        .iter()
        .find(|w| w.id == "alpha")
        .expect("alpha in slot");
    assert_eq!((alpha.x, alpha.y), (9, 1), "slot is edited in place");

    // The document carries the updated slot too.
    let doc = store.snapshot().await;
    let presets: Value = doc.get(keys::PRESETS).cloned().expect("presets stored");
    assert!(presets[1]["layout"]
        .as_array()
        .expect("layout array")
        .iter()
        .any(|w| w["id"] == "alpha" && w["x"] == 9));
}

#[tokio::test]
async fn clear_preset_deactivates_the_active_slot() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;
    engine.set_widget_enabled("alpha", true).await;
    engine
        .save_preset(0, PresetType::Grid)
        .await
        .expect("save preset");
    engine.load_preset(0).await.expect("load preset");
    assert_eq!(engine.active_preset(), Some(0));

    engine.clear_preset(0).await.expect("clear");
    assert_eq!(engine.active_preset(), None);
    assert!(engine.presets().get(0).is_none());
}

#[tokio::test]
async fn copy_and_blank_write_the_document() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;
    engine.set_widget_enabled("charlie", true).await;
    engine
        .save_preset(0, PresetType::Grid)
        .await
        .expect("save preset");

    engine.create_blank_preset(8).await.expect("blank");
    engine.copy_preset(0, 3).await.expect("copy");

    assert_eq!(engine.presets().get(8).expect("blank slot").name, "Preset 9");
    assert!(engine.presets().get(3).is_some());
    let doc = store.snapshot().await;
    let presets = doc.get(keys::PRESETS).expect("stored presets");
    assert!(!presets[3].is_null());
    assert!(!presets[8].is_null());
}

#[tokio::test]
async fn geometry_writes_both_keys() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;
    engine
        .set_grid_geometry(crate::GridGeometry {
            columns: 16,
            cell_height: 48,
        })
        .await;
    let doc = store.snapshot().await;
    assert_eq!(doc.get(keys::GRID_COLUMNS), Some(&Value::from(16u32)));
    assert_eq!(doc.get(keys::GRID_CELL_HEIGHT), Some(&Value::from(48u32)));
}

#[tokio::test]
async fn permission_healing_disables_and_writes_back() {
    let store = PreferenceStore::in_memory();
    let mut engine = ready_engine(&store).await;
    engine.set_widget_enabled("alpha", true).await;
    engine.set_widget_enabled("bravo", true).await;
    let mut events = engine.subscribe();

    let permissions = WidgetPermissions::restrict(["alpha"]);
    let disabled = engine.apply_permissions(&permissions).await;
    assert_eq!(disabled, vec!["bravo".to_string()]);
    assert_eq!(enabled_ids(&engine), vec!["alpha"]);
    assert_eq!(stored_meta(&store).await.source, SourceTag::WidgetRemove);
    assert!(drain_events(&mut events)
        .iter()
        .any(|e| matches!(e, EngineEvent::PermissionsHealed { .. })));

    // Healing is idempotent.
    assert!(engine.apply_permissions(&permissions).await.is_empty());
}
