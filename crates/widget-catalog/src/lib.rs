//! Widget catalog for the gridboard dashboard shell.
//!
//! The catalog is the full enumerable set of placeable widget definitions.
//! It is a read-only input to layout normalization: every dashboard layout
//! is reconciled against the catalog so that exactly one entry exists per
//! singleton widget id, with display metadata always sourced from here
//! rather than trusted from storage.
//!
//! Widget types that permit multiple simultaneous instances are addressed
//! by composite ids of the form `"<type>:<instance>"`. Composite ids never
//! appear in the catalog itself; [`Catalog::base`] resolves them to their
//! base definition.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display category for a widget definition.
///
/// Used for grouping in pickers and for synthesizing preset names from
/// widget combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Commodity prices and market reports.
    Markets,
    /// Environmental sensors and grow schedules.
    Climate,
    /// Door access and camera feeds.
    Access,
    /// Service and device health.
    System,
    /// Clocks, notes, and other small utilities.
    Utility,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Markets => "Markets",
            Category::Climate => "Climate",
            Category::Access => "Access",
            Category::System => "System",
            Category::Utility => "Utility",
        };
        write!(f, "{}", s)
    }
}

/// A single placeable widget definition.
///
/// `x`, `y`, `w`, `h` are the default grid placement used when a stored
/// layout has no entry for this widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetDef {
    /// Unique widget type identifier (never contains `:`).
    pub id: &'static str,
    /// Human-readable display name.
    pub title: &'static str,
    /// Display category.
    pub category: Category,
    /// One-line description shown in the widget picker.
    pub description: &'static str,
    /// Default grid column.
    pub x: u32,
    /// Default grid row.
    pub y: u32,
    /// Default width in grid columns.
    pub w: u32,
    /// Default height in grid rows.
    pub h: u32,
    /// Whether more than one instance may be placed at once.
    pub allow_multiple: bool,
    /// Upper bound on simultaneous instances (only meaningful when
    /// `allow_multiple` is set; `None` means unbounded).
    pub max_instances: Option<u32>,
}

/// Built-in widget definitions, in catalog order.
pub const BUILTIN_WIDGETS: &[WidgetDef] = &[
    WidgetDef {
        id: "market-prices",
        title: "Market Prices",
        category: Category::Markets,
        description: "Live commodity price board",
        x: 0,
        y: 0,
        w: 4,
        h: 2,
        allow_multiple: false,
        max_instances: None,
    },
    WidgetDef {
        id: "market-report",
        title: "Market Report",
        category: Category::Markets,
        description: "Weekly market report summaries",
        x: 4,
        y: 0,
        w: 4,
        h: 3,
        allow_multiple: false,
        max_instances: None,
    },
    WidgetDef {
        id: "climate-monitor",
        title: "Climate Monitor",
        category: Category::Climate,
        description: "Temperature and humidity by zone",
        x: 8,
        y: 0,
        w: 4,
        h: 2,
        allow_multiple: false,
        max_instances: None,
    },
    WidgetDef {
        id: "grow-schedule",
        title: "Grow Schedule",
        category: Category::Climate,
        description: "Upcoming light and irrigation windows",
        x: 0,
        y: 2,
        w: 4,
        h: 2,
        allow_multiple: false,
        max_instances: None,
    },
    WidgetDef {
        id: "door-access",
        title: "Door Access",
        category: Category::Access,
        description: "Recent door access events",
        x: 4,
        y: 3,
        w: 4,
        h: 2,
        allow_multiple: false,
        max_instances: None,
    },
    WidgetDef {
        id: "camera-feed",
        title: "Camera Feed",
        category: Category::Access,
        description: "Live camera stream",
        x: 8,
        y: 2,
        w: 3,
        h: 3,
        allow_multiple: true,
        max_instances: Some(4),
    },
    WidgetDef {
        id: "system-health",
        title: "System Health",
        category: Category::System,
        description: "Service and device health summary",
        x: 0,
        y: 4,
        w: 2,
        h: 2,
        allow_multiple: false,
        max_instances: None,
    },
    WidgetDef {
        id: "notes",
        title: "Notes",
        category: Category::Utility,
        description: "Free-form notes panel",
        x: 4,
        y: 5,
        w: 3,
        h: 2,
        allow_multiple: true,
        max_instances: Some(6),
    },
    WidgetDef {
        id: "clock",
        title: "Clock",
        category: Category::Utility,
        description: "Local and market time",
        x: 0,
        y: 6,
        w: 2,
        h: 1,
        allow_multiple: false,
        max_instances: None,
    },
];

/// Ordered collection of widget definitions.
///
/// Order matters: normalized layouts list widgets in catalog order.
///
/// # Example
///
/// ```
/// use widget_catalog::Catalog;
///
/// let catalog = Catalog::builtin();
/// assert!(catalog.get("clock").is_some());
/// assert!(catalog.get("clock:2").is_none());
/// assert!(catalog.base("notes:2").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
    defs: Vec<WidgetDef>,
}

impl Catalog {
    /// Returns the built-in catalog.
    pub fn builtin() -> Self {
        Self::from_defs(BUILTIN_WIDGETS.to_vec())
    }

    /// Builds a catalog from an explicit definition list.
    ///
    /// Intended for tests and embedders that supply their own widget set.
    pub fn from_defs(defs: Vec<WidgetDef>) -> Self {
        Self { defs }
    }

    /// Looks up a definition by exact id.
    ///
    /// Composite instance ids (`"type:instance"`) are not found here;
    /// use [`Catalog::base`] for those.
    pub fn get(&self, id: &str) -> Option<&WidgetDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    /// Resolves an id (singleton or composite) to its base definition.
    pub fn base(&self, id: &str) -> Option<&WidgetDef> {
        self.get(base_type(id).0)
    }

    /// Returns `true` if `id` is a composite instance id whose base type
    /// exists in the catalog and permits multiple instances.
    pub fn allows_instance(&self, id: &str) -> bool {
        let (base, instance) = base_type(id);
        if instance.is_none() {
            return false;
        }
        self.get(base).map(|d| d.allow_multiple).unwrap_or(false)
    }

    /// Iterates definitions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &WidgetDef> {
        self.defs.iter()
    }

    /// Returns the count of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` if the catalog has no definitions.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Splits a widget id into its base type and optional instance suffix.
///
/// `"notes:2"` yields `("notes", Some("2"))`; `"clock"` yields
/// `("clock", None)`.
pub fn base_type(id: &str) -> (&str, Option<&str>) {
    match id.split_once(':') {
        Some((base, instance)) => (base, Some(instance)),
        None => (id, None),
    }
}

/// Returns `true` if `id` carries an instance suffix.
pub fn is_instance_id(id: &str) -> bool {
    base_type(id).1.is_some()
}
