//! Unit tests for layout normalization, merging, and diffing.

use widget_catalog::{Catalog, Category, WidgetDef};

use crate::StoredWidget;

mod diff;
mod merge;

/// Builds a widget definition for test catalogs.
pub(crate) fn def(
    id: &'static str,
    title: &'static str,
    category: Category,
    allow_multiple: bool,
    max_instances: Option<u32>,
) -> WidgetDef {
    WidgetDef {
        id,
        title,
        category,
        description: "",
        x: 0,
        y: 0,
        w: 2,
        h: 2,
        allow_multiple,
        max_instances,
    }
}

/// A small fixed catalog: three singletons plus one multi-instance type
/// capped at two instances.
pub(crate) fn test_catalog() -> Catalog {
    Catalog::from_defs(vec![
        def("alpha", "Alpha", Category::Markets, false, None),
        def("bravo", "Bravo", Category::Climate, false, None),
        def("charlie", "Charlie", Category::Climate, false, None),
        def("panel", "Panel", Category::Utility, true, Some(2)),
    ])
}

/// Shorthand for a stored entry with explicit geometry and enabled flag.
pub(crate) fn stored(id: &str, x: u32, y: u32, w: u32, h: u32, enabled: bool) -> StoredWidget {
    StoredWidget {
        id: id.to_string(),
        x: Some(x),
        y: Some(y),
        w: Some(w),
        h: Some(h),
        enabled: Some(enabled),
    }
}
