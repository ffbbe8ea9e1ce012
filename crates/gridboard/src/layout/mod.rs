//! Pure layout normalization, merging, and diffing.
//!
//! A *normalized* (canonical) layout contains exactly one entry per
//! catalog widget id, enabled or not, followed by any multi-instance
//! entries whose base type permits multiplicity, in insertion order.
//! Every function here is synchronous and performs no I/O; all display
//! metadata is sourced from the catalog, never from storage.

use std::collections::HashSet;

use widget_catalog::{base_type, Catalog, WidgetDef};

use crate::{StoredWidget, Widget};

#[cfg(test)]
mod tests;

/// Added/removed widget-id sets between two layouts.
///
/// A pure reposition or resize is never structural; turning any widget
/// on or off is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDiff {
    /// `true` if any widget id is enabled in the new layout but not the old.
    pub widgets_added: bool,
    /// `true` if any widget id is enabled in the old layout but not the new.
    pub widgets_removed: bool,
    /// Ids enabled only in the new layout, sorted.
    pub added_ids: Vec<String>,
    /// Ids enabled only in the old layout, sorted.
    pub removed_ids: Vec<String>,
}

impl LayoutDiff {
    /// Returns `true` if the enabled-id sets differ at all.
    pub fn is_structural(&self) -> bool {
        self.widgets_added || self.widgets_removed
    }
}

/// Merges one stored entry over its catalog defaults.
///
/// An entry that is present in storage counts as enabled unless it says
/// otherwise. Category, title, and description always come from the
/// catalog, even when the stored entry carries stale copies.
fn merge_entry(def: &WidgetDef, stored: &StoredWidget) -> Widget {
    Widget {
        id: stored.id.clone(),
        x: stored.x.unwrap_or(def.x),
        y: stored.y.unwrap_or(def.y),
        w: stored.w.unwrap_or(def.w),
        h: stored.h.unwrap_or(def.h),
        enabled: stored.enabled.unwrap_or(true),
        title: def.title.to_string(),
        category: def.category,
        description: def.description.to_string(),
    }
}

/// Reconciles a possibly-partial stored layout against the catalog into
/// a canonical, fully-populated layout.
///
/// For every catalog entry: if the input has an entry with the same id,
/// its fields are merged over the catalog defaults with
/// `enabled = input.enabled ?? true`; otherwise the catalog default is
/// emitted disabled. Input entries with composite instance ids survive
/// when their base type allows multiplicity (capped at the base type's
/// `max_instances`); everything else is dropped. Duplicate ids keep the
/// first occurrence.
pub fn normalize(catalog: &Catalog, stored: &[StoredWidget]) -> Vec<Widget> {
    let mut out = Vec::with_capacity(catalog.len());

    for def in catalog.iter() {
        match stored.iter().find(|s| s.id == def.id) {
            Some(entry) => out.push(merge_entry(def, entry)),
            None => out.push(Widget::from_def(def, false)),
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for entry in stored {
        let (base, instance) = base_type(&entry.id);
        if instance.is_none() {
            continue;
        }
        let Some(def) = catalog.get(base) else {
            continue;
        };
        if !def.allow_multiple {
            continue;
        }
        if !seen.insert(entry.id.as_str()) {
            continue;
        }
        if let Some(max) = def.max_instances {
            if instance_count(&out, base) >= max {
                continue;
            }
        }
        out.push(merge_entry(def, entry));
    }

    out
}

/// Merges an active-only layout (enabled widgets with live positions,
/// as produced by a drag/resize surface that does not track disabled
/// widgets) into a canonical layout.
///
/// Every canonical widget absent from `active` is forced disabled; every
/// widget present is merged in and forced enabled. Active entries that
/// are valid multi-instance ids not yet in the canonical layout are
/// appended enabled. Catalog coverage is never lost.
pub fn merge_active(catalog: &Catalog, canonical: &[Widget], active: &[StoredWidget]) -> Vec<Widget> {
    let mut out = Vec::with_capacity(canonical.len());

    for widget in canonical {
        match active.iter().find(|a| a.id == widget.id) {
            Some(entry) => {
                let mut merged = widget.clone();
                merged.x = entry.x.unwrap_or(widget.x);
                merged.y = entry.y.unwrap_or(widget.y);
                merged.w = entry.w.unwrap_or(widget.w);
                merged.h = entry.h.unwrap_or(widget.h);
                merged.enabled = true;
                out.push(merged);
            }
            None => {
                let mut disabled = widget.clone();
                disabled.enabled = false;
                out.push(disabled);
            }
        }
    }

    for entry in active {
        if out.iter().any(|w| w.id == entry.id) {
            continue;
        }
        let (base, instance) = base_type(&entry.id);
        if instance.is_none() {
            continue;
        }
        let Some(def) = catalog.get(base) else {
            continue;
        };
        if !def.allow_multiple {
            continue;
        }
        if let Some(max) = def.max_instances {
            let existing = instance_count(&out, base);
            if existing >= max {
                continue;
            }
        }
        let mut merged = merge_entry(def, entry);
        merged.enabled = true;
        out.push(merged);
    }

    out
}

/// Counts multi-instance entries of `base` in a layout.
fn instance_count(layout: &[Widget], base: &str) -> u32 {
    layout
        .iter()
        .filter(|w| {
            let (b, instance) = base_type(&w.id);
            b == base && instance.is_some()
        })
        .count() as u32
}

/// Converts a canonical layout back into its stored form.
pub fn as_stored(layout: &[Widget]) -> Vec<StoredWidget> {
    layout.iter().map(StoredWidget::from).collect()
}

/// Compares two layouts for structural and positional equality.
///
/// Both sides are normalized first, then compared per id on
/// `{enabled, x, y, w, h}`. Display metadata is ignored. Any id present
/// on one side but not the other is a mismatch.
pub fn layouts_equal(catalog: &Catalog, a: &[StoredWidget], b: &[StoredWidget]) -> bool {
    let na = normalize(catalog, a);
    let nb = normalize(catalog, b);
    if na.len() != nb.len() {
        return false;
    }
    na.iter().all(|wa| {
        nb.iter().any(|wb| {
            wb.id == wa.id
                && wb.enabled == wa.enabled
                && wb.x == wa.x
                && wb.y == wa.y
                && wb.w == wa.w
                && wb.h == wa.h
        })
    })
}

/// Computes the enabled-id set difference between two canonical layouts.
///
/// Both inputs are expected to be normalized already (the sync engine
/// always holds canonical layouts).
pub fn structural_diff(old: &[Widget], new: &[Widget]) -> LayoutDiff {
    let old_ids: HashSet<&str> = old
        .iter()
        .filter(|w| w.enabled)
        .map(|w| w.id.as_str())
        .collect();
    let new_ids: HashSet<&str> = new
        .iter()
        .filter(|w| w.enabled)
        .map(|w| w.id.as_str())
        .collect();

    let mut added_ids: Vec<String> = new_ids
        .difference(&old_ids)
        .map(|id| id.to_string())
        .collect();
    let mut removed_ids: Vec<String> = old_ids
        .difference(&new_ids)
        .map(|id| id.to_string())
        .collect();
    added_ids.sort();
    removed_ids.sort();

    LayoutDiff {
        widgets_added: !added_ids.is_empty(),
        widgets_removed: !removed_ids.is_empty(),
        added_ids,
        removed_ids,
    }
}
