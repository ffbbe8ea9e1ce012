//! Preset name synthesis from widget content.
//!
//! A freshly saved slot gets a name derived from what is enabled in it:
//! a single widget lends its display name, a single shared category
//! becomes "<Category> Dashboard", a few recognizable category
//! combinations get curated names, and anything else falls back to a
//! widget count.

use std::collections::BTreeSet;

use widget_catalog::Category;

use crate::Widget;

/// Curated names for recognizable category combinations.
fn curated_name(categories: &BTreeSet<Category>) -> Option<&'static str> {
    use Category::*;
    let cats: Vec<Category> = categories.iter().copied().collect();
    match cats.as_slice() {
        [Markets, Climate] => Some("Operations Overview"),
        [Climate, Access] => Some("Facility Monitor"),
        [Markets, Climate, Access] => Some("Command Center"),
        _ => None,
    }
}

/// Synthesizes a display name for a preset from its layout.
pub fn synthesize_name(layout: &[Widget]) -> String {
    let enabled: Vec<&Widget> = layout.iter().filter(|w| w.enabled).collect();

    if enabled.len() == 1 {
        return enabled[0].title.clone();
    }

    if enabled.len() > 1 {
        let categories: BTreeSet<Category> = enabled.iter().map(|w| w.category).collect();
        if categories.len() == 1 {
            let category = categories.iter().next().expect("non-empty set");
            return format!("{} Dashboard", category);
        }
        if let Some(name) = curated_name(&categories) {
            return name.to_string();
        }
    }

    format!("Dashboard ({} widgets)", enabled.len())
}
