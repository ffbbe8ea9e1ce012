//! Unit tests for the synchronization engine.

use std::sync::Arc;

use tokio::sync::broadcast;
use widget_catalog::{Catalog, Category, WidgetDef};

use crate::identity::{Identity, StaticIdentity};
use crate::prefs::{PreferenceChange, PreferenceStore};
use crate::sync::{EditingGuard, EngineEvent, EngineOptions, SyncEngine};

mod local;

fn def(
    id: &'static str,
    title: &'static str,
    category: Category,
    allow_multiple: bool,
    max_instances: Option<u32>,
) -> WidgetDef {
    WidgetDef {
        id,
        title,
        category,
        description: "",
        x: 0,
        y: 0,
        w: 2,
        h: 2,
        allow_multiple,
        max_instances,
    }
}

/// Three singletons plus one capped multi-instance type, mirroring the
/// smallest catalog the policies care about.
pub(crate) fn test_catalog() -> Catalog {
    Catalog::from_defs(vec![
        def("alpha", "Alpha", Category::Markets, false, None),
        def("bravo", "Bravo", Category::Climate, false, None),
        def("charlie", "Charlie", Category::Climate, false, None),
        def("panel", "Panel", Category::Utility, true, Some(2)),
    ])
}

/// Builds an engine on a fresh session of `store`.
pub(crate) fn engine_on(store: &PreferenceStore, guard: EditingGuard) -> SyncEngine {
    engine_with_identity(store, guard, Arc::new(StaticIdentity::anonymous()))
}

pub(crate) fn engine_with_identity(
    store: &PreferenceStore,
    guard: EditingGuard,
    identity: Arc<dyn Identity>,
) -> SyncEngine {
    SyncEngine::new(
        store.session(),
        Arc::new(test_catalog()),
        identity,
        guard,
        EngineOptions::default(),
    )
}

/// Builds and initializes an engine on `store`.
pub(crate) async fn ready_engine(store: &PreferenceStore) -> SyncEngine {
    let mut engine = engine_on(store, EditingGuard::new());
    engine.initialize().await;
    engine
}

/// Feeds every queued transport notification through the engine.
pub(crate) async fn pump(engine: &mut SyncEngine, rx: &mut broadcast::Receiver<PreferenceChange>) {
    while let Ok(change) = rx.try_recv() {
        engine.handle_change(&change).await;
    }
}

/// Drains the engine event channel.
pub(crate) fn drain_events(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Ids of the enabled widgets in an engine's live layout.
pub(crate) fn enabled_ids(engine: &SyncEngine) -> Vec<String> {
    engine
        .layout()
        .iter()
        .filter(|w| w.enabled)
        .map(|w| w.id.clone())
        .collect()
}
