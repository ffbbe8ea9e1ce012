//! Identity collaborator boundary.
//!
//! Authentication lives outside this crate. The sync engine only needs
//! an opaque view of who is signed in and whether an administrator is
//! impersonating them, refreshed on every remote notification.

use std::sync::atomic::{AtomicBool, Ordering};

/// An authenticated account, as far as the dashboard cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable account id.
    pub id: String,
    /// Account email.
    pub email: String,
    /// Name shown in the account menu.
    pub display_name: String,
}

/// Read-only view of authentication state.
pub trait Identity: Send + Sync {
    /// Returns `true` if an account is signed in.
    fn is_authenticated(&self) -> bool;

    /// The signed-in account, if any.
    fn user(&self) -> Option<User>;

    /// Returns `true` while an administrator is impersonating the
    /// account.
    fn is_impersonating(&self) -> bool {
        false
    }
}

/// Fixed identity for tests, the CLI, and single-user deployments.
///
/// Impersonation can be toggled at runtime so tests can observe the
/// engine's shadow state refreshing.
#[derive(Debug)]
pub struct StaticIdentity {
    user: Option<User>,
    impersonating: AtomicBool,
}

impl StaticIdentity {
    /// No account signed in.
    pub fn anonymous() -> Self {
        Self {
            user: None,
            impersonating: AtomicBool::new(false),
        }
    }

    /// A signed-in account.
    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            impersonating: AtomicBool::new(false),
        }
    }

    /// Toggles the impersonation flag.
    pub fn set_impersonating(&self, value: bool) {
        self.impersonating.store(value, Ordering::SeqCst);
    }
}

impl Identity for StaticIdentity {
    fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn user(&self) -> Option<User> {
        self.user.clone()
    }

    fn is_impersonating(&self) -> bool {
        self.impersonating.load(Ordering::SeqCst)
    }
}
