//! Persisted, multi-session preference transport.
//!
//! The preference document is a JSON object addressed by dot-notation
//! keys, owned collectively by all sessions of one account. No session
//! is authoritative and there is no locking; the only discipline is
//! advisory (source tagging and structural gating happen in the [`crate::sync`]
//! engine). The transport's job is narrower: hold the shared document,
//! broadcast every write to all subscribed sessions, classify changes as
//! local or remote by origin session id, and persist through a pluggable
//! [`SyncBackend`].
//!
//! Within one session a write is reflected in the shared document
//! synchronously, before any subscriber wakes. Across sessions the only
//! ordering is the broadcast channel's delivery order, and the last
//! write observed wins per key.

use async_trait::async_trait;
use thiserror::Error;

mod document;
mod file;
mod memory;
pub mod migration;
mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use document::Document;
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use store::{PreferenceChange, PreferenceSession, PreferenceStore, SetOptions};

/// Dot-notation keys of the preference document.
pub mod keys {
    /// The stored dashboard layout (array of widgets).
    pub const LAYOUT: &str = "dashboard.layout";
    /// The nine preset slots (array, `null` for empty slots).
    pub const PRESETS: &str = "dashboard.presets";
    /// Display mode of the live dashboard.
    pub const PRESET_TYPE: &str = "dashboard.preset_type";
    /// Index of the active preset slot, or `null`.
    pub const ACTIVE_PRESET: &str = "dashboard.active_preset";
    /// Source tag and writer session recorded with every layout write.
    pub const LAYOUT_META: &str = "dashboard.layout_meta";
    /// Number of grid columns.
    pub const GRID_COLUMNS: &str = "grid.columns";
    /// Height of one grid row in pixels.
    pub const GRID_CELL_HEIGHT: &str = "grid.cell_height";
    /// Document schema version, bumped by migration.
    pub const SCHEMA_VERSION: &str = "schema.version";
    /// Prefix shared by all dashboard keys.
    pub const DASHBOARD_NS: &str = "dashboard.";
}

/// Errors surfaced by a [`SyncBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// An I/O failure while reading or writing the stored document.
    #[error("preference backend I/O error")]
    Io(#[from] std::io::Error),

    /// The backend could not be reached.
    #[error("preference backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors from preference transport operations.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// A value could not be serialized for storage.
    #[error("failed to serialize preference value for key '{key}'")]
    Serialize {
        /// Key that was being written.
        key: String,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The backend reported a failure.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Durable storage behind a [`PreferenceStore`].
///
/// `fetch` returning `Ok(None)` means the call completed but no data
/// materialized; the store's loaded flag stays down and the caller may
/// retry. A backend with nothing stored yet reports an empty document
/// instead, so that a first login counts as loaded.
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// Fetches the stored document, if any materialized.
    async fn fetch(&self) -> Result<Option<Document>, BackendError>;

    /// Persists the document.
    async fn persist(&self, doc: &Document) -> Result<(), BackendError>;

    /// Folds any legacy storage shape into the stored document.
    ///
    /// Runs before the first fetch and must be idempotent. Returns
    /// `true` when anything changed.
    async fn migrate(&self) -> Result<bool, BackendError> {
        Ok(false)
    }
}
