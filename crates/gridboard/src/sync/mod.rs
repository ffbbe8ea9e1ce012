//! Preference synchronization engine.
//!
//! One engine runs per session. It owns that session's view of the
//! shared preference document (live layout, presets, display mode,
//! active preset, grid geometry) and reconciles it with writes from
//! other sessions. Three triggers drive it:
//!
//! - **Initial load** ([`SyncEngine::initialize`]): legacy migration,
//!   then up to three sync attempts with linear backoff, then state
//!   publication. Sync failure is soft; the engine proceeds on whatever
//!   is cached.
//! - **Remote notification** ([`SyncEngine::handle_change`]): classifies
//!   each remote write and applies it, defers it behind the editing
//!   guard, or queues it for explicit confirmation.
//! - **Guard release** ([`SyncEngine::poll_guard`]): called every render
//!   pass; flushes an editing-deferred update once the guard drops,
//!   unless the update is structural.
//!
//! The classification policy: silently overwriting an in-progress local
//! edit is the worst failure mode, so the guard defers everything;
//! widgets appearing or disappearing unasked is confusing even when not
//! editing, so structural changes wait for confirmation; a reposition
//! from another session is safe and blocking it would make the
//! dashboard feel broken, so it applies immediately; and a preset load
//! is an explicit, already-confirmed user action that no local
//! heuristic may block.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use widget_catalog::{base_type, Catalog};

use crate::identity::{Identity, User};
use crate::layout::{self, LayoutDiff};
use crate::permissions::WidgetPermissions;
use crate::prefs::{keys, PreferenceChange, PreferenceSession, SetOptions};
use crate::presets::{PresetError, PresetStore};
use crate::{GridGeometry, LayoutMeta, PresetType, SourceTag, StoredWidget, Widget, PRESET_SLOTS};

pub mod guard;

pub use guard::{EditingGuard, EditingScope};

#[cfg(test)]
mod tests;

/// Capacity of the engine event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Default count of initial sync attempts.
pub const DEFAULT_SYNC_ATTEMPTS: u32 = 3;

/// Default base backoff between failed sync attempts. The wait grows
/// linearly: base after attempt one, twice that after attempt two.
pub const DEFAULT_SYNC_BACKOFF: Duration = Duration::from_millis(500);

/// Why a remote update was not applied immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferReason {
    /// The editing guard was up when the update arrived.
    Editing,
    /// The update adds or removes widgets and needs explicit
    /// confirmation.
    Structural,
}

/// A stashed remote update awaiting guard release or confirmation.
///
/// A newer remote notification simply overwrites the stash; the
/// deferred payload is most-recent-wins and two pending diffs are never
/// merged.
#[derive(Debug, Clone)]
pub struct PendingUpdate {
    /// The remote layout, normalized.
    pub layout: Vec<Widget>,
    /// The remote preset slots.
    pub presets: PresetStore,
    /// The remote display mode.
    pub preset_type: PresetType,
    /// The remote active preset index.
    pub active_preset: Option<usize>,
    /// Structural diff against the live layout at stash time, for UI
    /// surfacing.
    pub diff: LayoutDiff,
    /// Why the update is parked.
    pub reason: DeferReason,
}

/// Notifications emitted by the engine for the UI layer.
///
/// How these surface (toast, blocking dialog) is the embedder's choice.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Initial load finished; state is published.
    Ready,
    /// The live layout was replaced by a remote update.
    LayoutReplaced {
        /// Source tag carried by the remote write.
        source: SourceTag,
    },
    /// Grid geometry changed remotely; the layout was re-read in place.
    GeometryRefreshed {
        /// The new geometry.
        geometry: GridGeometry,
    },
    /// A remote update was stashed instead of applied.
    UpdateDeferred {
        /// Why it was stashed.
        reason: DeferReason,
        /// Its structural diff.
        diff: LayoutDiff,
    },
    /// A structural update waits for [`SyncEngine::apply_pending_update`].
    ConfirmationRequired {
        /// Its structural diff.
        diff: LayoutDiff,
    },
    /// A stashed update was applied.
    PendingApplied,
    /// A preset load was rejected (empty slot or nothing enabled).
    PresetRejected {
        /// The slot that was addressed.
        index: usize,
    },
    /// Unauthorized widgets were force-disabled and written back.
    PermissionsHealed {
        /// Ids that were disabled.
        disabled: Vec<String>,
    },
}

/// Tunables for a [`SyncEngine`].
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Count of initial sync attempts before falling back to cache.
    pub sync_attempts: u32,
    /// Base backoff between failed attempts, multiplied by the attempt
    /// number.
    pub sync_backoff: Duration,
    /// Debounce for layout writes from drag and resize commits.
    pub write_debounce: Option<Duration>,
    /// Geometry assumed until the document says otherwise.
    pub geometry: GridGeometry,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sync_attempts: DEFAULT_SYNC_ATTEMPTS,
            sync_backoff: DEFAULT_SYNC_BACKOFF,
            write_debounce: None,
            geometry: GridGeometry::default(),
        }
    }
}

/// The remote state read for one classification pass.
struct RemoteSnapshot {
    layout: Vec<Widget>,
    presets: PresetStore,
    preset_type: PresetType,
    active_preset: Option<usize>,
}

/// Per-session synchronization engine.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use gridboard::identity::StaticIdentity;
/// use gridboard::prefs::PreferenceStore;
/// use gridboard::sync::{EditingGuard, EngineOptions, SyncEngine};
/// use widget_catalog::Catalog;
///
/// # async fn run() {
/// let store = PreferenceStore::in_memory();
/// let session = store.session();
/// let mut rx = session.subscribe();
/// let mut engine = SyncEngine::new(
///     session,
///     Arc::new(Catalog::builtin()),
///     Arc::new(StaticIdentity::anonymous()),
///     EditingGuard::new(),
///     EngineOptions::default(),
/// );
/// engine.initialize().await;
/// loop {
///     if let Ok(change) = rx.recv().await {
///         engine.handle_change(&change).await;
///     }
///     engine.poll_guard();
/// }
/// # }
/// ```
pub struct SyncEngine {
    session: PreferenceSession,
    catalog: Arc<Catalog>,
    identity: Arc<dyn Identity>,
    guard: EditingGuard,
    options: EngineOptions,

    layout: Vec<Widget>,
    presets: PresetStore,
    preset_type: PresetType,
    active_preset: Option<usize>,
    geometry: GridGeometry,
    pending: Option<PendingUpdate>,
    guard_was_editing: bool,
    ready: bool,

    user: Option<User>,
    impersonating: bool,

    events_tx: broadcast::Sender<EngineEvent>,
}

impl SyncEngine {
    /// Creates an engine over one preference session.
    ///
    /// The guard is the caller's; the UI layer keeps a clone and raises
    /// it while dialogs are open. The engine starts with an all-disabled
    /// catalog-default layout until [`SyncEngine::initialize`] runs.
    pub fn new(
        session: PreferenceSession,
        catalog: Arc<Catalog>,
        identity: Arc<dyn Identity>,
        guard: EditingGuard,
        options: EngineOptions,
    ) -> Self {
        let (events_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let guard_was_editing = guard.is_editing();
        let layout = layout::normalize(&catalog, &[]);
        Self {
            session,
            catalog,
            identity,
            guard,
            layout,
            presets: PresetStore::new(),
            preset_type: PresetType::default(),
            active_preset: None,
            geometry: options.geometry,
            pending: None,
            guard_was_editing,
            ready: false,
            user: None,
            impersonating: false,
            events_tx,
            options,
        }
    }

    /// Subscribes to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events_tx.subscribe()
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events_tx.send(event);
    }

    // -----------------------------------------------------------------
    // Trigger a: initial load
    // -----------------------------------------------------------------

    /// Runs migration, the retried initial sync, and state publication.
    ///
    /// Sync failure across all attempts is soft: the engine logs, keeps
    /// whatever the store already caches, and becomes ready anyway. The
    /// retry loop has no cancellation; it runs to success or exhaustion.
    pub async fn initialize(&mut self) {
        match self.session.migrate_legacy().await {
            Ok(true) => tracing::info!("migrated legacy preference data"),
            Ok(false) => {}
            Err(e) => tracing::warn!("legacy preference migration failed: {}", e),
        }

        for attempt in 1..=self.options.sync_attempts {
            match self.session.sync_on_login().await {
                // The call returning is not enough; verify data actually
                // materialized before declaring success.
                Ok(()) if self.session.is_loaded() => {
                    tracing::debug!("preference sync succeeded on attempt {}", attempt);
                    break;
                }
                Ok(()) => {
                    tracing::warn!("preference sync attempt {} returned no data", attempt);
                }
                Err(e) => {
                    tracing::warn!("preference sync attempt {} failed: {}", attempt, e);
                }
            }
            if attempt < self.options.sync_attempts {
                tokio::time::sleep(self.options.sync_backoff * attempt).await;
            }
        }
        if !self.session.is_loaded() {
            tracing::warn!("preference sync exhausted retries, using cached preferences");
        }

        self.reload_state().await;
        if self.session.is_loaded() {
            self.seed_missing_defaults().await;
        }
        self.refresh_identity();
        self.ready = true;
        self.emit(EngineEvent::Ready);
    }

    async fn reload_state(&mut self) {
        self.layout = self.read_layout().await;
        self.presets = self.read_presets().await;
        self.preset_type = self
            .session
            .get_or(keys::PRESET_TYPE, PresetType::default())
            .await;
        self.active_preset = self.read_active_preset().await;
        self.geometry = self.read_geometry().await;
    }

    /// First login: the account has no document yet. Write the
    /// catalog-defaulted, all-disabled state so every later session
    /// starts from the same baseline.
    async fn seed_missing_defaults(&mut self) {
        if self.session.get::<Value>(keys::LAYOUT).await.is_some() {
            return;
        }
        tracing::info!("seeding preference document with catalog defaults");
        let entries = vec![
            (keys::LAYOUT.to_string(), layout_value(&self.layout)),
            (keys::PRESETS.to_string(), self.presets.to_value()),
            (
                keys::PRESET_TYPE.to_string(),
                serde_json::to_value(self.preset_type).unwrap_or(Value::Null),
            ),
            (keys::ACTIVE_PRESET.to_string(), Value::Null),
            (keys::GRID_COLUMNS.to_string(), self.geometry.columns.into()),
            (
                keys::GRID_CELL_HEIGHT.to_string(),
                self.geometry.cell_height.into(),
            ),
            (
                keys::LAYOUT_META.to_string(),
                self.meta_value(SourceTag::RemoteSync),
            ),
        ];
        self.session.update(entries, SetOptions::default()).await;
    }

    // -----------------------------------------------------------------
    // Trigger b: remote notification
    // -----------------------------------------------------------------

    /// Reconciles one transport notification.
    ///
    /// Own writes are ignored here; the writer already applied them
    /// synchronously. Geometry changes short-circuit everything else
    /// for the notification. Otherwise the remote snapshot is read,
    /// diffed against the live layout, and applied, deferred, or queued
    /// for confirmation according to the source tag and the guard.
    pub async fn handle_change(&mut self, change: &PreferenceChange) {
        if !self.session.is_remote(change) {
            return;
        }

        let geometry = self.read_geometry().await;
        if geometry != self.geometry {
            // Geometry changes invalidate absolute positions: re-read
            // and re-normalize the layout in place, skip classification.
            self.geometry = geometry;
            self.layout = self.read_layout().await;
            tracing::debug!(
                columns = geometry.columns,
                cell_height = geometry.cell_height,
                "grid geometry changed remotely, layout re-read"
            );
            self.emit(EngineEvent::GeometryRefreshed { geometry });
            self.refresh_identity();
            return;
        }

        let relevant = change.changed_keys.is_empty()
            || change
                .changed_keys
                .iter()
                .any(|k| k.starts_with(keys::DASHBOARD_NS));
        if relevant {
            let snapshot = self.read_snapshot().await;
            let diff = layout::structural_diff(&self.layout, &snapshot.layout);
            let source = self.read_source().await;
            self.classify(snapshot, diff, source);
        }

        self.refresh_identity();
    }

    fn classify(&mut self, snapshot: RemoteSnapshot, diff: LayoutDiff, source: Option<SourceTag>) {
        if source == Some(SourceTag::PresetLoad) {
            // An explicit preset load on another session outranks any
            // local state, editing or not.
            self.apply_snapshot(snapshot);
            self.emit(EngineEvent::LayoutReplaced {
                source: SourceTag::PresetLoad,
            });
            return;
        }

        if self.guard.is_editing() {
            tracing::debug!("deferring remote update while a local edit is open");
            self.stash(snapshot, diff, DeferReason::Editing);
            return;
        }

        if diff.is_structural() {
            tracing::debug!(
                added = ?diff.added_ids,
                removed = ?diff.removed_ids,
                "structural remote update queued for confirmation"
            );
            self.stash(snapshot, diff, DeferReason::Structural);
            return;
        }

        self.apply_snapshot(snapshot);
        self.emit(EngineEvent::LayoutReplaced {
            source: source.unwrap_or(SourceTag::RemoteSync),
        });
    }

    /// Overwrites any previous stash; pending payloads are
    /// most-recent-wins and never merged.
    fn stash(&mut self, snapshot: RemoteSnapshot, diff: LayoutDiff, reason: DeferReason) {
        let event_diff = diff.clone();
        self.pending = Some(PendingUpdate {
            layout: snapshot.layout,
            presets: snapshot.presets,
            preset_type: snapshot.preset_type,
            active_preset: snapshot.active_preset,
            diff,
            reason,
        });
        match reason {
            DeferReason::Editing => self.emit(EngineEvent::UpdateDeferred {
                reason,
                diff: event_diff,
            }),
            DeferReason::Structural => self.emit(EngineEvent::ConfirmationRequired {
                diff: event_diff,
            }),
        }
    }

    fn apply_snapshot(&mut self, snapshot: RemoteSnapshot) {
        self.layout = snapshot.layout;
        self.presets = snapshot.presets;
        self.preset_type = snapshot.preset_type;
        self.active_preset = snapshot.active_preset;
        self.pending = None;
    }

    // -----------------------------------------------------------------
    // Trigger c: guard release
    // -----------------------------------------------------------------

    /// Observes the guard once per render pass.
    ///
    /// On a true-to-false transition, an editing-deferred non-structural
    /// update applies immediately. A structural one is promoted to
    /// confirmation-required instead; only
    /// [`SyncEngine::apply_pending_update`] applies those.
    pub fn poll_guard(&mut self) {
        let editing = self.guard.is_editing();
        let released = self.guard_was_editing && !editing;
        self.guard_was_editing = editing;
        if !released {
            return;
        }

        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if pending.reason != DeferReason::Editing {
            return;
        }
        if pending.diff.is_structural() {
            pending.reason = DeferReason::Structural;
            let diff = pending.diff.clone();
            self.emit(EngineEvent::ConfirmationRequired { diff });
            return;
        }

        let pending = self.pending.take().expect("pending checked above");
        self.apply_pending(pending);
    }

    /// Applies the stashed update unconditionally and clears it.
    ///
    /// Returns `false` when nothing was pending.
    pub fn apply_pending_update(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                self.apply_pending(pending);
                true
            }
            None => false,
        }
    }

    fn apply_pending(&mut self, pending: PendingUpdate) {
        self.layout = pending.layout;
        self.presets = pending.presets;
        self.preset_type = pending.preset_type;
        self.active_preset = pending.active_preset;
        self.pending = None;
        self.emit(EngineEvent::PendingApplied);
    }

    // -----------------------------------------------------------------
    // Local write paths
    // -----------------------------------------------------------------

    /// Commits an active layout from the grid interaction surface.
    ///
    /// `active` holds only the visible widgets with their live
    /// positions. The canonical layout is merged so no catalog coverage
    /// is lost, then written out under the given source tag. When a
    /// preset is active its slot is edited in place as well.
    pub async fn commit_active_layout(&mut self, active: &[StoredWidget], source: SourceTag) {
        self.layout = layout::merge_active(&self.catalog, &self.layout, active);
        self.write_layout(source, self.options.write_debounce).await;
    }

    /// Enables or disables one widget.
    ///
    /// Returns `false` for an unknown id. A no-op toggle writes nothing.
    pub async fn set_widget_enabled(&mut self, id: &str, enabled: bool) -> bool {
        let Some(widget) = self.layout.iter_mut().find(|w| w.id == id) else {
            tracing::warn!("toggle for unknown widget '{}'", id);
            return false;
        };
        if widget.enabled == enabled {
            return true;
        }
        widget.enabled = enabled;
        let source = if enabled {
            SourceTag::WidgetAdd
        } else {
            SourceTag::WidgetRemove
        };
        self.write_layout(source, None).await;
        true
    }

    /// Places a new instance of a multi-instance widget type.
    ///
    /// Returns the new composite id, or `None` when the type is unknown,
    /// not multi-instance, or already at its instance cap.
    pub async fn add_widget_instance(&mut self, base: &str) -> Option<String> {
        let def = *self.catalog.get(base)?;
        if !def.allow_multiple {
            tracing::warn!("widget type '{}' does not allow instances", base);
            return None;
        }
        let existing = self
            .layout
            .iter()
            .filter(|w| {
                let (b, instance) = base_type(&w.id);
                b == base && instance.is_some()
            })
            .count() as u32;
        if let Some(max) = def.max_instances {
            if existing >= max {
                tracing::debug!("widget type '{}' is at its instance cap", base);
                return None;
            }
        }

        // Smallest free instance number keeps ids short and stable.
        let mut n = 1u32;
        let id = loop {
            let candidate = format!("{}:{}", base, n);
            if !self.layout.iter().any(|w| w.id == candidate) {
                break candidate;
            }
            n += 1;
        };

        let mut widget = Widget::from_def(&def, true);
        widget.id = id.clone();
        self.layout.push(widget);
        self.write_layout(SourceTag::WidgetAdd, None).await;
        Some(id)
    }

    /// Removes a multi-instance widget entirely.
    ///
    /// Singleton widgets are disabled, never removed; returns `false`
    /// for them and for unknown ids.
    pub async fn remove_widget_instance(&mut self, id: &str) -> bool {
        if base_type(id).1.is_none() {
            return false;
        }
        let before = self.layout.len();
        self.layout.retain(|w| w.id != id);
        if self.layout.len() == before {
            return false;
        }
        self.write_layout(SourceTag::WidgetRemove, None).await;
        true
    }

    /// Saves the live layout into a preset slot.
    pub async fn save_preset(
        &mut self,
        index: usize,
        preset_type: PresetType,
    ) -> Result<(), PresetError> {
        self.presets
            .save(index, &self.layout, preset_type, &self.catalog)?;
        self.write_presets().await;
        Ok(())
    }

    /// Loads a preset slot into the live layout and records it active.
    ///
    /// Rejection (empty slot, nothing enabled) mutates nothing and
    /// surfaces as [`EngineEvent::PresetRejected`]. A successful load is
    /// written out tagged `preset-load`, which every other session
    /// applies unconditionally.
    pub async fn load_preset(&mut self, index: usize) -> Result<(), PresetError> {
        let (loaded_layout, preset_type) = match self.presets.load(index, &self.catalog) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!("rejected preset load from slot {}: {}", index, e);
                self.emit(EngineEvent::PresetRejected { index });
                return Err(e);
            }
        };

        self.layout = loaded_layout;
        self.preset_type = preset_type;
        self.active_preset = Some(index);

        let entries = vec![
            (keys::LAYOUT.to_string(), layout_value(&self.layout)),
            (
                keys::LAYOUT_META.to_string(),
                self.meta_value(SourceTag::PresetLoad),
            ),
            (
                keys::PRESET_TYPE.to_string(),
                serde_json::to_value(self.preset_type).unwrap_or(Value::Null),
            ),
            (keys::ACTIVE_PRESET.to_string(), Value::from(index)),
        ];
        self.session.update(entries, SetOptions::default()).await;
        Ok(())
    }

    /// Empties a preset slot. Deactivates it first if it was active.
    pub async fn clear_preset(&mut self, index: usize) -> Result<(), PresetError> {
        self.presets.clear(index)?;
        let mut entries = vec![(keys::PRESETS.to_string(), self.presets.to_value())];
        if self.active_preset == Some(index) {
            self.active_preset = None;
            entries.push((keys::ACTIVE_PRESET.to_string(), Value::Null));
        }
        self.session.update(entries, SetOptions::default()).await;
        Ok(())
    }

    /// Writes an all-disabled blank preset into a slot.
    pub async fn create_blank_preset(&mut self, index: usize) -> Result<(), PresetError> {
        self.presets.create_blank(index, &self.catalog)?;
        self.write_presets().await;
        Ok(())
    }

    /// Copies one preset slot into another.
    pub async fn copy_preset(&mut self, source: usize, target: usize) -> Result<(), PresetError> {
        self.presets.copy(source, target, &self.catalog)?;
        self.write_presets().await;
        Ok(())
    }

    /// Switches the live display mode.
    pub async fn set_preset_type(&mut self, preset_type: PresetType) {
        self.preset_type = preset_type;
        let entries = vec![(
            keys::PRESET_TYPE.to_string(),
            serde_json::to_value(preset_type).unwrap_or(Value::Null),
        )];
        self.session.update(entries, SetOptions::default()).await;
    }

    /// Writes new grid geometry. Other sessions re-read their layouts
    /// when they observe it.
    pub async fn set_grid_geometry(&mut self, geometry: GridGeometry) {
        self.geometry = geometry;
        let entries = vec![
            (keys::GRID_COLUMNS.to_string(), geometry.columns.into()),
            (
                keys::GRID_CELL_HEIGHT.to_string(),
                geometry.cell_height.into(),
            ),
        ];
        self.session.update(entries, SetOptions::default()).await;
    }

    /// Applies a permission set to the live layout.
    ///
    /// Enabled widgets the set forbids are force-disabled and the
    /// cleaned layout is written back tagged `widget-remove`. This is a
    /// self-healing correction; the returned ids are what got disabled.
    pub async fn apply_permissions(&mut self, permissions: &WidgetPermissions) -> Vec<String> {
        let unauthorized = permissions.unauthorized_ids(&self.layout);
        if unauthorized.is_empty() {
            return unauthorized;
        }
        tracing::info!(
            "disabling {} widgets no longer permitted for this account",
            unauthorized.len()
        );
        for widget in self.layout.iter_mut() {
            if unauthorized.contains(&widget.id) {
                widget.enabled = false;
            }
        }
        self.write_layout(SourceTag::WidgetRemove, None).await;
        self.emit(EngineEvent::PermissionsHealed {
            disabled: unauthorized.clone(),
        });
        unauthorized
    }

    /// Writes the live layout and its source tag in one notification,
    /// updating the active preset slot in place when one is active.
    async fn write_layout(&mut self, source: SourceTag, debounce: Option<Duration>) {
        let mut entries = vec![
            (keys::LAYOUT.to_string(), layout_value(&self.layout)),
            (keys::LAYOUT_META.to_string(), self.meta_value(source)),
        ];
        if let Some(index) = self.active_preset {
            if self.presets.update_layout(index, &self.layout) {
                entries.push((keys::PRESETS.to_string(), self.presets.to_value()));
            }
        }
        let opts = SetOptions {
            debounce,
            notify_local: false,
        };
        self.session.update(entries, opts).await;
    }

    async fn write_presets(&mut self) {
        let entries = vec![(keys::PRESETS.to_string(), self.presets.to_value())];
        self.session.update(entries, SetOptions::default()).await;
    }

    // -----------------------------------------------------------------
    // Reads and state access
    // -----------------------------------------------------------------

    async fn read_layout(&self) -> Vec<Widget> {
        let stored: Vec<StoredWidget> = self.session.get_or(keys::LAYOUT, Vec::new()).await;
        layout::normalize(&self.catalog, &stored)
    }

    async fn read_presets(&self) -> PresetStore {
        match self.session.get::<Value>(keys::PRESETS).await {
            Some(value) => PresetStore::from_value(&value),
            None => PresetStore::new(),
        }
    }

    async fn read_active_preset(&self) -> Option<usize> {
        self.session
            .get::<Option<usize>>(keys::ACTIVE_PRESET)
            .await
            .flatten()
            .filter(|i| *i < PRESET_SLOTS)
    }

    async fn read_geometry(&self) -> GridGeometry {
        GridGeometry {
            columns: self
                .session
                .get_or(keys::GRID_COLUMNS, self.options.geometry.columns)
                .await,
            cell_height: self
                .session
                .get_or(keys::GRID_CELL_HEIGHT, self.options.geometry.cell_height)
                .await,
        }
    }

    async fn read_snapshot(&self) -> RemoteSnapshot {
        RemoteSnapshot {
            layout: self.read_layout().await,
            presets: self.read_presets().await,
            preset_type: self.session.get_or(keys::PRESET_TYPE, self.preset_type).await,
            active_preset: self.read_active_preset().await,
        }
    }

    async fn read_source(&self) -> Option<SourceTag> {
        self.session
            .get::<LayoutMeta>(keys::LAYOUT_META)
            .await
            .map(|meta| meta.source)
    }

    fn meta_value(&self, source: SourceTag) -> Value {
        serde_json::to_value(LayoutMeta {
            source,
            session: self.session.id().to_string(),
        })
        .unwrap_or(Value::Null)
    }

    fn refresh_identity(&mut self) {
        self.user = self.identity.user();
        self.impersonating = self.identity.is_impersonating();
    }

    /// The live canonical layout.
    pub fn layout(&self) -> &[Widget] {
        &self.layout
    }

    /// The preset slots as this session sees them.
    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    /// The live display mode.
    pub fn preset_type(&self) -> PresetType {
        self.preset_type
    }

    /// The active preset slot, if any.
    pub fn active_preset(&self) -> Option<usize> {
        self.active_preset
    }

    /// The last observed grid geometry.
    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    /// The stashed remote update, if any.
    pub fn pending(&self) -> Option<&PendingUpdate> {
        self.pending.as_ref()
    }

    /// Returns `true` once initial load has finished.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Shadow of the identity collaborator's signed-in user.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Shadow of the identity collaborator's impersonation flag.
    pub fn is_impersonating(&self) -> bool {
        self.impersonating
    }

    /// The engine's preference session.
    pub fn session(&self) -> &PreferenceSession {
        &self.session
    }
}

fn layout_value(layout: &[Widget]) -> Value {
    serde_json::to_value(layout).unwrap_or(Value::Null)
}
