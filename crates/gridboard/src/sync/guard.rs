//! Editing guard.
//!
//! A single caller-owned boolean, true while a widget picker, settings
//! panel, or preset-naming dialog is locally mutating preferences. The
//! sync engine reads it synchronously when a remote notification
//! arrives and polls it on every render pass to flush eligible deferred
//! updates once it flips back to false. It has no logic of its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared atomic editing flag.
///
/// Cloning is cheap; clones observe the same flag. The UI layer holds
/// one clone and the sync engine another.
#[derive(Debug, Clone, Default)]
pub struct EditingGuard {
    editing: Arc<AtomicBool>,
}

impl EditingGuard {
    /// Creates a guard in the not-editing state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the editing flag.
    pub fn set_editing(&self, value: bool) {
        self.editing.store(value, Ordering::SeqCst);
    }

    /// Reads the editing flag.
    pub fn is_editing(&self) -> bool {
        self.editing.load(Ordering::SeqCst)
    }

    /// Raises the flag for the lifetime of the returned scope.
    ///
    /// Scopes do not nest; one dialog is open at a time.
    pub fn scope(&self) -> EditingScope {
        self.set_editing(true);
        EditingScope {
            guard: self.clone(),
        }
    }
}

/// Clears the editing flag when dropped.
#[must_use = "the guard clears as soon as the scope is dropped"]
pub struct EditingScope {
    guard: EditingGuard,
}

impl Drop for EditingScope {
    fn drop(&mut self) {
        self.guard.set_editing(false);
    }
}
