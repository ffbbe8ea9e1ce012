//! TOML configuration schema types for gridboard.
//!
//! All structs derive `Deserialize` and `Serialize` with sensible
//! defaults via `#[serde(default)]`. Duration fields use human-readable
//! strings (e.g. `"250ms"`, `"500ms"`) parsed by the `humantime` crate
//! when the config is turned into engine options.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::xdg;
use crate::sync::EngineOptions;
use crate::GridGeometry;

/// Root configuration encompassing all sections.
///
/// Corresponds to the full TOML file structure:
/// ```toml
/// [grid]
/// [store]
/// [log]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Grid defaults seeded into a fresh preference document.
    pub grid: GridConfig,
    /// Preference store location and write behavior.
    pub store: StoreConfig,
    /// Logging settings.
    pub log: LogConfig,
}

impl Config {
    /// The preference document path: `store.data_file` when set (tilde
    /// expanded), the XDG data path otherwise.
    pub fn document_path(&self) -> PathBuf {
        if self.store.data_file.is_empty() {
            xdg::document_path()
        } else {
            xdg::expand_tilde(&self.store.data_file)
        }
    }

    /// Turns the config into engine tunables.
    ///
    /// Unparseable duration strings fall back to their defaults with a
    /// warning; configuration mistakes never block startup.
    pub fn engine_options(&self) -> EngineOptions {
        let defaults = EngineOptions::default();
        let backoff = parse_duration_or(
            &self.store.sync_backoff,
            "store.sync_backoff",
            defaults.sync_backoff,
        );
        let debounce =
            parse_duration_or(&self.store.debounce, "store.debounce", Duration::ZERO);
        EngineOptions {
            sync_attempts: self.store.sync_attempts.max(1),
            sync_backoff: backoff,
            write_debounce: if debounce.is_zero() {
                None
            } else {
                Some(debounce)
            },
            geometry: GridGeometry {
                columns: self.grid.columns,
                cell_height: self.grid.cell_height,
            },
        }
    }
}

fn parse_duration_or(text: &str, field: &str, fallback: Duration) -> Duration {
    match humantime::parse_duration(text) {
        Ok(duration) => duration,
        Err(e) => {
            tracing::warn!("invalid duration '{}' for {}: {}, using default", text, field, e);
            fallback
        }
    }
}

/// Grid defaults used until the preference document says otherwise.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Number of grid columns.
    pub columns: u32,
    /// Height of one grid row in pixels.
    pub cell_height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        let geometry = GridGeometry::default();
        Self {
            columns: geometry.columns,
            cell_height: geometry.cell_height,
        }
    }
}

/// Preference store settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the preference document. Empty string means the XDG
    /// data location.
    pub data_file: String,
    /// Debounce for layout writes from drag and resize commits, as a
    /// human-readable duration. `"0s"` disables debouncing.
    pub debounce: String,
    /// Count of initial sync attempts before falling back to cache.
    pub sync_attempts: u32,
    /// Base backoff between failed sync attempts; the wait grows
    /// linearly with the attempt number.
    pub sync_backoff: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: String::new(),
            debounce: "250ms".to_string(),
            sync_attempts: 3,
            sync_backoff: "500ms".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Logging verbosity.
    pub level: LogLevel,
}

/// Log verbosity levels (kebab-case in TOML).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    Warn,
    /// Informational messages (default).
    #[default]
    Info,
    /// Debug-level detail.
    Debug,
    /// Full trace output.
    Trace,
}

impl LogLevel {
    /// The equivalent `tracing` filter directive.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
