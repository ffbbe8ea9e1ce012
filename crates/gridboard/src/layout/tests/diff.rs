//! Tests for structural diffing and layout equality.

use super::{stored, test_catalog};
use crate::layout::{as_stored, layouts_equal, normalize, structural_diff, LayoutDiff};

#[test]
fn identical_layouts_have_empty_diff() {
    let catalog = test_catalog();
    let layout = normalize(&catalog, &[stored("alpha", 0, 0, 2, 2, true)]);
    let diff = structural_diff(&layout, &layout);
    assert_eq!(diff, LayoutDiff::default());
    assert!(!diff.is_structural());
}

#[test]
fn reposition_is_never_structural() {
    let catalog = test_catalog();
    let old = normalize(&catalog, &[stored("alpha", 0, 0, 2, 2, true)]);
    let new = normalize(&catalog, &[stored("alpha", 6, 3, 4, 1, true)]);
    let diff = structural_diff(&old, &new);
    assert!(!diff.is_structural());
}

#[test]
fn enabling_a_widget_is_structural() {
    let catalog = test_catalog();
    let old = normalize(&catalog, &[stored("alpha", 0, 0, 2, 2, true)]);
    let new = normalize(
        &catalog,
        &[stored("alpha", 0, 0, 2, 2, true), stored("bravo", 2, 0, 2, 2, true)],
    );
    let diff = structural_diff(&old, &new);
    assert!(diff.widgets_added);
    assert!(!diff.widgets_removed);
    assert_eq!(diff.added_ids, vec!["bravo".to_string()]);
}

#[test]
fn disabling_a_widget_is_structural() {
    let catalog = test_catalog();
    let old = normalize(
        &catalog,
        &[stored("alpha", 0, 0, 2, 2, true), stored("bravo", 2, 0, 2, 2, true)],
    );
    let new = normalize(
        &catalog,
        &[stored("alpha", 0, 0, 2, 2, true), stored("bravo", 2, 0, 2, 2, false)],
    );
    let diff = structural_diff(&old, &new);
    assert!(!diff.widgets_added);
    assert!(diff.widgets_removed);
    assert_eq!(diff.removed_ids, vec!["bravo".to_string()]);
}

#[test]
fn swap_reports_both_added_and_removed() {
    let catalog = test_catalog();
    let old = normalize(&catalog, &[stored("alpha", 0, 0, 2, 2, true)]);
    let new = normalize(&catalog, &[stored("charlie", 0, 0, 2, 2, true)]);
    let diff = structural_diff(&old, &new);
    assert!(diff.widgets_added);
    assert!(diff.widgets_removed);
    assert_eq!(diff.added_ids, vec!["charlie".to_string()]);
    assert_eq!(diff.removed_ids, vec!["alpha".to_string()]);
}

#[test]
fn count_preserving_swap_is_still_structural() {
    // Disabling one widget and enabling another keeps the enabled count
    // constant but changes the id set, which is what matters.
    let catalog = test_catalog();
    let old = normalize(&catalog, &[stored("alpha", 0, 0, 2, 2, true)]);
    let new = normalize(&catalog, &[stored("bravo", 0, 0, 2, 2, true)]);
    assert!(structural_diff(&old, &new).is_structural());
}

#[test]
fn equality_ignores_display_metadata() {
    let catalog = test_catalog();
    let layout = normalize(&catalog, &[stored("alpha", 1, 1, 2, 2, true)]);
    let mut renamed = layout.clone();
    renamed[0].title = "Something Else".to_string();
    renamed[0].description = "stale".to_string();
    assert!(layouts_equal(&catalog, &as_stored(&layout), &as_stored(&renamed)));
}

#[test]
fn equality_fails_on_geometry_mismatch() {
    let catalog = test_catalog();
    let a = vec![stored("alpha", 1, 1, 2, 2, true)];
    let b = vec![stored("alpha", 1, 2, 2, 2, true)];
    assert!(!layouts_equal(&catalog, &a, &b));
}

#[test]
fn equality_fails_on_enabled_mismatch() {
    let catalog = test_catalog();
    let a = vec![stored("alpha", 1, 1, 2, 2, true)];
    let b = vec![stored("alpha", 1, 1, 2, 2, false)];
    assert!(!layouts_equal(&catalog, &a, &b));
}

#[test]
fn equality_fails_on_instance_set_mismatch() {
    let catalog = test_catalog();
    let a = vec![stored("panel:1", 0, 0, 2, 2, true)];
    let b: Vec<crate::StoredWidget> = vec![];
    assert!(!layouts_equal(&catalog, &a, &b));
}

#[test]
fn diff_covers_multi_instance_ids() {
    let catalog = test_catalog();
    let old = normalize(&catalog, &[]);
    let new = normalize(&catalog, &[stored("panel:1", 0, 0, 2, 2, true)]);
    let diff = structural_diff(&old, &new);
    assert_eq!(diff.added_ids, vec!["panel:1".to_string()]);
}
