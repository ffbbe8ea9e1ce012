//! Gridboard library
//!
//! This crate provides the core of a personalizable dashboard shell:
//! users arrange widgets into a grid, save up to nine named layout
//! snapshots ("presets"), and keep those preferences consistent across
//! multiple concurrently open sessions of the same account.
//!
//! The interesting part is not the widgets (thin display modules rendered
//! elsewhere) but the preference synchronization engine: a client-side
//! mechanism that reconciles a shared layout/preset document across
//! multiple writers without a central lock, while never silently
//! destroying a user's in-flight edit. See the [`sync`] module.
//!
//! Visual rendering, the drag/resize surface, and authentication are
//! external collaborators consumed at trait boundaries ([`render`],
//! [`identity`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use widget_catalog::{Category, WidgetDef};

/// Configuration utilities including XDG path resolution.
pub mod config;

/// Identity collaborator boundary (authentication state shadow).
pub mod identity;

/// Pure layout normalization, merging, and diffing.
pub mod layout;

/// Per-widget permission set and layout healing.
pub mod permissions;

/// Nine-slot preset store with name synthesis.
pub mod presets;

/// Persisted, multi-session preference document transport.
pub mod prefs;

/// Widget renderer boundary (frames for enabled widgets).
pub mod render;

/// Synchronization engine, editing guard, and pending updates.
pub mod sync;

/// Number of preset slots. Slots are addressed by index only.
pub const PRESET_SLOTS: usize = 9;

/// One placed widget instance in a layout.
///
/// `title`, `category`, and `description` are display metadata copied
/// from the catalog during normalization; they are cosmetic and never
/// trusted from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Widget id; `"<type>:<instance>"` for multi-instance widgets.
    pub id: String,
    /// Grid column.
    pub x: u32,
    /// Grid row.
    pub y: u32,
    /// Width in grid columns.
    pub w: u32,
    /// Height in grid rows.
    pub h: u32,
    /// Whether the widget is shown on the dashboard.
    pub enabled: bool,
    /// Display name from the catalog.
    pub title: String,
    /// Display category from the catalog.
    pub category: Category,
    /// One-line description from the catalog.
    pub description: String,
}

impl Widget {
    /// Builds a widget from a catalog definition at its default placement.
    pub fn from_def(def: &WidgetDef, enabled: bool) -> Self {
        Self {
            id: def.id.to_string(),
            x: def.x,
            y: def.y,
            w: def.w,
            h: def.h,
            enabled,
            title: def.title.to_string(),
            category: def.category,
            description: def.description.to_string(),
        }
    }
}

/// The tolerant persisted form of a widget.
///
/// Every field except `id` is optional so that partial or stale stored
/// layouts deserialize without error; missing fields are filled from
/// catalog defaults during normalization. Unknown fields in stored JSON
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredWidget {
    /// Widget id; `"<type>:<instance>"` for multi-instance widgets.
    pub id: String,
    /// Grid column, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<u32>,
    /// Grid row, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<u32>,
    /// Width in grid columns, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    /// Height in grid rows, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    /// Enabled flag, if recorded. Absent means enabled for entries that
    /// are present in a stored layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl StoredWidget {
    /// Builds a bare entry with only an id, all other fields unset.
    pub fn bare(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }
}

impl From<&Widget> for StoredWidget {
    fn from(w: &Widget) -> Self {
        Self {
            id: w.id.clone(),
            x: Some(w.x),
            y: Some(w.y),
            w: Some(w.w),
            h: Some(w.h),
            enabled: Some(w.enabled),
        }
    }
}

/// User action that produced a preference write.
///
/// Recorded alongside the layout in the preference document so that
/// *other* sessions can infer writer intent before deciding how to react.
/// Metadata riding with the document, not part of the layout itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTag {
    /// Drag or resize commit from the grid interaction surface.
    LocalInteraction,
    /// A widget was enabled or an instance added.
    WidgetAdd,
    /// A widget was disabled or an instance removed.
    WidgetRemove,
    /// A preset was loaded into the live layout.
    PresetLoad,
    /// A write produced by the sync machinery itself.
    RemoteSync,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceTag::LocalInteraction => "local-interaction",
            SourceTag::WidgetAdd => "widget-add",
            SourceTag::WidgetRemove => "widget-remove",
            SourceTag::PresetLoad => "preset-load",
            SourceTag::RemoteSync => "remote-sync",
        };
        write!(f, "{}", s)
    }
}

/// Display mode stored with a preset and with the live dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetType {
    /// Widgets arranged on the grid.
    #[default]
    Grid,
    /// A single widget expanded to the full viewport.
    Fullscreen,
}

/// Source metadata recorded with every layout write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutMeta {
    /// The user action that produced the write.
    pub source: SourceTag,
    /// Id of the session that performed the write.
    pub session: String,
}

/// Grid geometry shared by all sessions of an account.
///
/// Absolute widget positions are only meaningful relative to a geometry,
/// so a geometry change invalidates positions and forces a layout
/// re-read on every other session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Number of grid columns.
    pub columns: u32,
    /// Height of one grid row in pixels.
    pub cell_height: u32,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            columns: 12,
            cell_height: 80,
        }
    }
}
