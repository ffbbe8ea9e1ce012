//! Shared preference store and per-session handles.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use crate::prefs::{Document, PrefsError, SyncBackend};

/// Capacity of the change broadcast channel. Allows bursty write
/// scenarios without dropping notifications.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// A single preference write, broadcast to every subscribed session.
///
/// Receivers classify the change as local or remote by comparing
/// `origin` against their own session id; see
/// [`PreferenceSession::is_remote`]. An empty `changed_keys` means the
/// whole document may have changed (a full refresh).
#[derive(Debug, Clone)]
pub struct PreferenceChange {
    /// Session id of the writer.
    pub origin: String,
    /// Keys touched by the write.
    pub changed_keys: Vec<String>,
    /// Whether the writer wants its own session notified too.
    pub notify_local: bool,
    /// Store write version after this change.
    pub version: u64,
}

/// Options for a preference write.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    /// Defer backend persistence by this long, coalescing bursts.
    /// The in-memory update and the notification always happen
    /// immediately; only durable storage is delayed.
    pub debounce: Option<Duration>,
    /// Deliver the change notification to the writing session as well.
    pub notify_local: bool,
}

impl SetOptions {
    /// Persistence deferred by `delay`, no local echo.
    pub fn debounced(delay: Duration) -> Self {
        Self {
            debounce: Some(delay),
            notify_local: false,
        }
    }
}

struct Shared {
    doc: RwLock<Document>,
    backend: Arc<dyn SyncBackend>,
    change_tx: broadcast::Sender<PreferenceChange>,
    loaded: AtomicBool,
    version: AtomicU64,
    persist_gen: AtomicU64,
}

/// One account's preference document, shared by all of its sessions.
///
/// Cloning is cheap and clones share the same document, backend, and
/// change channel. Create per-session handles with
/// [`PreferenceStore::session`].
#[derive(Clone)]
pub struct PreferenceStore {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("loaded", &self.is_loaded())
            .field("version", &self.version())
            .field("subscriber_count", &self.shared.change_tx.receiver_count())
            .finish()
    }
}

impl PreferenceStore {
    /// Creates a store over the given backend. The document starts empty
    /// and unloaded until [`PreferenceStore::sync_on_login`] succeeds.
    pub fn new(backend: Arc<dyn SyncBackend>) -> Self {
        let (change_tx, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                doc: RwLock::new(Document::new()),
                backend,
                change_tx,
                loaded: AtomicBool::new(false),
                version: AtomicU64::new(0),
                persist_gen: AtomicU64::new(0),
            }),
        }
    }

    /// Creates a store over an in-memory backend. Useful for tests and
    /// ephemeral sessions.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(crate::prefs::MemoryBackend::new()))
    }

    /// Spawns a new session handle with a fresh session id.
    pub fn session(&self) -> PreferenceSession {
        PreferenceSession {
            store: self.clone(),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Returns `true` once stored data has materialized in this store.
    pub fn is_loaded(&self) -> bool {
        self.shared.loaded.load(Ordering::SeqCst)
    }

    /// Returns the current write version.
    pub fn version(&self) -> u64 {
        self.shared.version.load(Ordering::SeqCst)
    }

    /// Runs the backend's legacy migration. Idempotent.
    pub async fn migrate_legacy(&self) -> Result<bool, PrefsError> {
        Ok(self.shared.backend.migrate().await?)
    }

    /// Pulls the stored document into memory, one attempt.
    ///
    /// On success with data the in-memory document is replaced and the
    /// loaded flag raised. A call that returns without materializing
    /// data leaves the flag down so callers can verify and retry; retry
    /// policy lives in the sync engine, not here.
    pub async fn sync_on_login(&self) -> Result<(), PrefsError> {
        match self.shared.backend.fetch().await {
            Ok(Some(remote)) => {
                *self.shared.doc.write().await = remote;
                self.shared.loaded.store(true, Ordering::SeqCst);
                self.shared.version.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Ok(None) => {
                tracing::debug!("sync returned without materializing data");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns a snapshot of the current document.
    pub async fn snapshot(&self) -> Document {
        self.shared.doc.read().await.clone()
    }

    /// Persists the current document immediately, cancelling any pending
    /// debounced persist.
    pub async fn flush(&self) -> Result<(), PrefsError> {
        self.shared.persist_gen.fetch_add(1, Ordering::SeqCst);
        let doc = self.snapshot().await;
        self.shared.backend.persist(&doc).await?;
        Ok(())
    }

    /// Applies entries to the document, notifies subscribers, and
    /// arranges persistence. Returns the new write version.
    ///
    /// Persistence failures are logged, never propagated; the in-memory
    /// document is already updated and every session keeps working from
    /// it (durable storage is best effort by design of the protocol).
    pub(crate) async fn write(
        &self,
        entries: Vec<(String, Value)>,
        origin: &str,
        opts: SetOptions,
    ) -> u64 {
        let version = {
            let mut doc = self.shared.doc.write().await;
            for (key, value) in &entries {
                doc.set(key, value.clone());
            }
            self.shared.version.fetch_add(1, Ordering::SeqCst) + 1
        };

        let changed_keys: Vec<String> = entries.into_iter().map(|(k, _)| k).collect();
        let change = PreferenceChange {
            origin: origin.to_string(),
            changed_keys,
            notify_local: opts.notify_local,
            version,
        };
        match self.shared.change_tx.send(change) {
            Ok(count) => tracing::trace!("preference change sent to {} subscribers", count),
            Err(_) => tracing::trace!("no subscribers for preference change"),
        }

        match opts.debounce {
            None => self.persist_now().await,
            Some(delay) => self.schedule_persist(delay),
        }
        version
    }

    async fn persist_now(&self) {
        self.shared.persist_gen.fetch_add(1, Ordering::SeqCst);
        let doc = self.snapshot().await;
        if let Err(e) = self.shared.backend.persist(&doc).await {
            tracing::warn!("failed to persist preference document: {}", e);
        }
    }

    /// Schedules a persist after `delay`. Later writes supersede the
    /// scheduled one; the task re-reads the document at fire time, so it
    /// never writes stale data.
    fn schedule_persist(&self, delay: Duration) {
        let generation = self.shared.persist_gen.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if shared.persist_gen.load(Ordering::SeqCst) != generation {
                return;
            }
            let doc = shared.doc.read().await.clone();
            if let Err(e) = shared.backend.persist(&doc).await {
                tracing::warn!("failed to persist preference document: {}", e);
            }
        });
    }
}

/// Per-session handle onto a [`PreferenceStore`].
///
/// Each handle carries a unique session id used to tag writes and to
/// classify incoming changes as local or remote.
#[derive(Debug, Clone)]
pub struct PreferenceSession {
    store: PreferenceStore,
    session_id: String,
}

impl PreferenceSession {
    /// This session's id.
    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// The underlying shared store.
    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    /// Reads and deserializes the value at `key`.
    ///
    /// Returns `None` when the key is absent or the stored value does
    /// not deserialize (logged, treated as absent).
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = {
            let doc = self.store.shared.doc.read().await;
            doc.get(key).cloned()
        }?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("malformed preference value at '{}': {}", key, e);
                None
            }
        }
    }

    /// Reads the value at `key`, falling back to `default`.
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).await.unwrap_or(default)
    }

    /// Writes one key.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        opts: SetOptions,
    ) -> Result<u64, PrefsError> {
        let value = serde_json::to_value(value).map_err(|e| PrefsError::Serialize {
            key: key.to_string(),
            source: e,
        })?;
        Ok(self
            .store
            .write(vec![(key.to_string(), value)], &self.session_id, opts)
            .await)
    }

    /// Writes several keys atomically under one notification.
    ///
    /// Used for writes that must land together, like a layout and the
    /// source tag describing it.
    pub async fn update(&self, entries: Vec<(String, Value)>, opts: SetOptions) -> u64 {
        self.store.write(entries, &self.session_id, opts).await
    }

    /// Subscribes to change notifications for the whole account.
    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.store.shared.change_tx.subscribe()
    }

    /// Returns `true` if the change was written by another session.
    pub fn is_remote(&self, change: &PreferenceChange) -> bool {
        change.origin != self.session_id
    }

    /// Returns `true` if this session should act on the change: remote
    /// changes always, own writes only when the writer asked for a
    /// local echo.
    pub fn should_deliver(&self, change: &PreferenceChange) -> bool {
        self.is_remote(change) || change.notify_local
    }

    /// See [`PreferenceStore::is_loaded`].
    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    /// See [`PreferenceStore::sync_on_login`].
    pub async fn sync_on_login(&self) -> Result<(), PrefsError> {
        self.store.sync_on_login().await
    }

    /// See [`PreferenceStore::migrate_legacy`].
    pub async fn migrate_legacy(&self) -> Result<bool, PrefsError> {
        self.store.migrate_legacy().await
    }

    /// See [`PreferenceStore::flush`].
    pub async fn flush(&self) -> Result<(), PrefsError> {
        self.store.flush().await
    }
}
