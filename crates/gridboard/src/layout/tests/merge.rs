//! Tests for merging an active-only layout into the canonical layout.

use super::{stored, test_catalog};
use crate::layout::{merge_active, normalize};
use crate::StoredWidget;

#[test]
fn absent_widgets_are_forced_disabled() {
    let catalog = test_catalog();
    let canonical = normalize(
        &catalog,
        &[stored("alpha", 0, 0, 2, 2, true), stored("bravo", 2, 0, 2, 2, true)],
    );
    // The drag surface reports only alpha; bravo was removed from the grid.
    let merged = merge_active(&catalog, &canonical, &[stored("alpha", 1, 1, 2, 2, true)]);
    let bravo = merged.iter().find(|w| w.id == "bravo").expect("bravo");
    assert!(!bravo.enabled);
}

#[test]
fn present_widgets_are_forced_enabled_with_live_geometry() {
    let catalog = test_catalog();
    let canonical = normalize(&catalog, &[stored("alpha", 0, 0, 2, 2, false)]);
    let merged = merge_active(&catalog, &canonical, &[stored("alpha", 5, 3, 4, 2, false)]);
    let alpha = merged.iter().find(|w| w.id == "alpha").expect("alpha");
    // The active layout only ever contains visible widgets, so presence
    // wins over whatever enabled flag the entry carries.
    assert!(alpha.enabled);
    assert_eq!((alpha.x, alpha.y, alpha.w, alpha.h), (5, 3, 4, 2));
}

#[test]
fn catalog_coverage_is_never_lost() {
    let catalog = test_catalog();
    let canonical = normalize(&catalog, &[]);
    let merged = merge_active(&catalog, &canonical, &[]);
    assert_eq!(merged.len(), catalog.len());
}

#[test]
fn new_instances_from_active_layout_are_appended() {
    let catalog = test_catalog();
    let canonical = normalize(&catalog, &[]);
    let merged = merge_active(&catalog, &canonical, &[stored("panel:1", 4, 4, 2, 2, true)]);
    let panel = merged.iter().find(|w| w.id == "panel:1").expect("panel:1");
    assert!(panel.enabled);
    assert_eq!(merged.len(), catalog.len() + 1);
}

#[test]
fn unknown_active_entries_are_dropped() {
    let catalog = test_catalog();
    let canonical = normalize(&catalog, &[]);
    let merged = merge_active(&catalog, &canonical, &[stored("ghost", 0, 0, 1, 1, true)]);
    assert!(merged.iter().all(|w| w.id != "ghost"));
}

#[test]
fn instances_beyond_cap_are_not_appended() {
    let catalog = test_catalog();
    let canonical = normalize(
        &catalog,
        &[
            stored("panel:1", 0, 0, 2, 2, true),
            stored("panel:2", 2, 0, 2, 2, true),
        ],
    );
    let merged = merge_active(
        &catalog,
        &canonical,
        &[
            stored("panel:1", 0, 0, 2, 2, true),
            stored("panel:2", 2, 0, 2, 2, true),
            stored("panel:3", 4, 0, 2, 2, true),
        ],
    );
    assert!(merged.iter().all(|w| w.id != "panel:3"));
}

#[test]
fn existing_instances_absent_from_active_become_disabled() {
    let catalog = test_catalog();
    let canonical = normalize(&catalog, &[stored("panel:1", 0, 0, 2, 2, true)]);
    let merged = merge_active(&catalog, &canonical, &[]);
    let panel = merged.iter().find(|w| w.id == "panel:1").expect("panel:1");
    assert!(!panel.enabled);
}

#[test]
fn partial_active_geometry_keeps_canonical_fields() {
    let catalog = test_catalog();
    let canonical = normalize(&catalog, &[stored("alpha", 1, 2, 3, 4, true)]);
    let entry = StoredWidget {
        id: "alpha".to_string(),
        x: Some(8),
        ..StoredWidget::default()
    };
    let merged = merge_active(&catalog, &canonical, &[entry]);
    let alpha = merged.iter().find(|w| w.id == "alpha").expect("alpha");
    assert_eq!((alpha.x, alpha.y, alpha.w, alpha.h), (8, 2, 3, 4));
}
