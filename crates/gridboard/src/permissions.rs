//! Per-widget permission set.
//!
//! Widget access can be granted and revoked per account by an
//! administrator. A layout saved while a widget was permitted may still
//! reference it after revocation; the sync engine detects this whenever
//! permission data changes, force-disables the offending widgets, and
//! writes the cleaned layout back. Self-healing, not a user-facing
//! error.

use std::collections::HashSet;

use widget_catalog::base_type;

use crate::Widget;

/// The set of widget types an account may display.
///
/// Multi-instance ids are checked by base type, so revoking `notes`
/// covers `notes:1` and every other instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetPermissions {
    allowed: Option<HashSet<String>>,
}

impl WidgetPermissions {
    /// Every widget is permitted. The default for accounts with no
    /// explicit grants.
    pub fn allow_all() -> Self {
        Self { allowed: None }
    }

    /// Only the listed base widget types are permitted.
    pub fn restrict<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: Some(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Returns `true` if the id (singleton or instance) is permitted.
    pub fn allows(&self, id: &str) -> bool {
        match &self.allowed {
            None => true,
            Some(allowed) => allowed.contains(base_type(id).0),
        }
    }

    /// Returns `true` if this is a restricted set.
    pub fn is_restricted(&self) -> bool {
        self.allowed.is_some()
    }

    /// Ids of enabled widgets in `layout` that this set forbids.
    pub fn unauthorized_ids(&self, layout: &[Widget]) -> Vec<String> {
        layout
            .iter()
            .filter(|w| w.enabled && !self.allows(&w.id))
            .map(|w| w.id.clone())
            .collect()
    }
}

impl Default for WidgetPermissions {
    fn default() -> Self {
        Self::allow_all()
    }
}
