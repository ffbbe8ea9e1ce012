//! Nine-slot preset store.
//!
//! A preset is a named snapshot of a full layout plus a display mode.
//! Slots are addressed by index only (0 through 8, no reordering). Slot
//! content, once loaded, becomes editable in place: further edits to the
//! live layout are written back into the originating slot by the sync
//! engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use widget_catalog::Catalog;

use crate::layout::{as_stored, normalize};
use crate::{PresetType, Widget, PRESET_SLOTS};

pub mod naming;

/// Errors from preset slot operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    /// Slot index is outside `0..PRESET_SLOTS`.
    #[error("preset slot {0} is out of range")]
    SlotOutOfRange(usize),

    /// The addressed slot holds no preset.
    #[error("preset slot {0} is empty")]
    EmptySlot(usize),

    /// The addressed slot has a preset with no enabled widgets.
    #[error("preset slot {0} has no enabled widgets")]
    NoEnabledWidgets(usize),
}

/// A named layout snapshot stored in one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Display mode for this preset.
    #[serde(rename = "type", default)]
    pub preset_type: PresetType,
    /// The snapshotted layout.
    pub layout: Vec<Widget>,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// When the slot was first written.
    pub created_at: DateTime<Utc>,
    /// When the slot content last changed.
    pub updated_at: DateTime<Utc>,
}

/// Fixed-size addressable preset slot array.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetStore {
    slots: Vec<Option<Preset>>,
}

impl PresetStore {
    /// Creates a store with all nine slots empty.
    pub fn new() -> Self {
        Self {
            slots: vec![None; PRESET_SLOTS],
        }
    }

    /// Rebuilds a store from a persisted JSON value.
    ///
    /// Tolerant by design: a non-array value yields an empty store, a
    /// slot that fails to parse becomes an empty slot, and the array is
    /// padded or truncated to exactly nine entries.
    pub fn from_value(value: &Value) -> Self {
        let mut store = Self::new();
        let Some(entries) = value.as_array() else {
            if !value.is_null() {
                tracing::warn!("persisted presets are not an array, starting empty");
            }
            return store;
        };
        for (i, entry) in entries.iter().take(PRESET_SLOTS).enumerate() {
            if entry.is_null() {
                continue;
            }
            match serde_json::from_value::<Preset>(entry.clone()) {
                Ok(preset) => store.slots[i] = Some(preset),
                Err(e) => {
                    tracing::warn!("dropping malformed preset in slot {}: {}", i, e);
                }
            }
        }
        store
    }

    /// Serializes the store as a nine-element JSON array with `null`
    /// entries for empty slots.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.slots).unwrap_or(Value::Null)
    }

    /// Returns the preset in `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    /// Returns all slots in order.
    pub fn slots(&self) -> &[Option<Preset>] {
        &self.slots
    }

    /// Returns the count of occupied slots.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn check_index(index: usize) -> Result<(), PresetError> {
        if index >= PRESET_SLOTS {
            return Err(PresetError::SlotOutOfRange(index));
        }
        Ok(())
    }

    /// Saves a layout snapshot into a slot.
    ///
    /// The layout is normalized first. An occupied slot keeps its name,
    /// description, and creation time and gets the new layout, type, and
    /// update time. An empty slot gets a name synthesized from the
    /// enabled widget content.
    pub fn save(
        &mut self,
        index: usize,
        layout: &[Widget],
        preset_type: PresetType,
        catalog: &Catalog,
    ) -> Result<&Preset, PresetError> {
        Self::check_index(index)?;
        let normalized = normalize(catalog, &as_stored(layout));
        let now = Utc::now();

        let slot = &mut self.slots[index];
        match slot {
            Some(existing) => {
                existing.layout = normalized;
                existing.preset_type = preset_type;
                existing.updated_at = now;
            }
            None => {
                *slot = Some(Preset {
                    preset_type,
                    name: naming::synthesize_name(&normalized),
                    description: String::new(),
                    layout: normalized,
                    created_at: now,
                    updated_at: now,
                });
            }
        }
        Ok(slot.as_ref().expect("slot was just written"))
    }

    /// Writes an all-disabled layout into a slot under the name
    /// `"Preset <index+1>"`.
    pub fn create_blank(&mut self, index: usize, catalog: &Catalog) -> Result<&Preset, PresetError> {
        Self::check_index(index)?;
        let now = Utc::now();
        self.slots[index] = Some(Preset {
            preset_type: PresetType::Grid,
            layout: normalize(catalog, &[]),
            name: format!("Preset {}", index + 1),
            description: String::new(),
            created_at: now,
            updated_at: now,
        });
        Ok(self.slots[index].as_ref().expect("slot was just written"))
    }

    /// Empties a slot, returning what it held.
    pub fn clear(&mut self, index: usize) -> Result<Option<Preset>, PresetError> {
        Self::check_index(index)?;
        Ok(self.slots[index].take())
    }

    /// Copies one slot's layout and type into another, following the
    /// same merge rule as [`PresetStore::save`].
    pub fn copy(
        &mut self,
        source: usize,
        target: usize,
        catalog: &Catalog,
    ) -> Result<(), PresetError> {
        Self::check_index(source)?;
        Self::check_index(target)?;
        let (layout, preset_type) = match &self.slots[source] {
            Some(preset) => (preset.layout.clone(), preset.preset_type),
            None => return Err(PresetError::EmptySlot(source)),
        };
        self.save(target, &layout, preset_type, catalog)?;
        Ok(())
    }

    /// Loads a slot for activation.
    ///
    /// Fails without touching any state when the slot is empty or holds
    /// no enabled widget. On success returns the normalized, deep-cloned
    /// layout and the preset's display mode; the caller makes it the
    /// live layout and records the slot as active.
    pub fn load(
        &self,
        index: usize,
        catalog: &Catalog,
    ) -> Result<(Vec<Widget>, PresetType), PresetError> {
        Self::check_index(index)?;
        let preset = self.slots[index]
            .as_ref()
            .ok_or(PresetError::EmptySlot(index))?;
        let layout = normalize(catalog, &as_stored(&preset.layout));
        if !layout.iter().any(|w| w.enabled) {
            return Err(PresetError::NoEnabledWidgets(index));
        }
        Ok((layout, preset.preset_type))
    }

    /// Replaces the layout of an occupied slot in place, refreshing its
    /// update time. Used for edits while the slot is active.
    ///
    /// Returns `false` when the slot is empty or out of range (the slot
    /// may have been cleared remotely since activation).
    pub fn update_layout(&mut self, index: usize, layout: &[Widget]) -> bool {
        let Some(Some(preset)) = self.slots.get_mut(index) else {
            return false;
        };
        preset.layout = layout.to_vec();
        preset.updated_at = Utc::now();
        true
    }
}

impl Default for PresetStore {
    fn default() -> Self {
        Self::new()
    }
}
