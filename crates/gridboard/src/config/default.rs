//! Default configuration template and file creation utilities.
//!
//! Provides a well-commented TOML template that matches
//! `Config::default()` and functions to write it to the XDG config
//! path.

use std::fs;
use std::path::PathBuf;

use crate::config::error::ConfigError;
use crate::config::xdg;

// ---------------------------------------------------------------------------
// Default TOML template
// ---------------------------------------------------------------------------

/// A well-commented TOML template with all default values.
///
/// Every value here must match `Config::default()` from `schema.rs`.
/// Sections: `[grid]`, `[store]`, `[log]`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Gridboard Configuration
#
# This file was auto-generated with default values.
# All values shown below are the built-in defaults.
#
# Location: $XDG_CONFIG_HOME/gridboard/config.toml

# ==============================================================================
# Grid Configuration
# ==============================================================================

[grid]

# Number of grid columns. Seeded into a fresh preference document;
# after that the shared document is authoritative for all sessions.
columns = 12

# Height of one grid row in pixels.
cell_height = 80

# ==============================================================================
# Preference Store Configuration
# ==============================================================================

[store]

# Path of the preference document. Empty string means the XDG data
# location ($XDG_DATA_HOME/gridboard/document.json).
# Tilde (~) is expanded to the user's home directory.
data_file = ""

# Debounce for layout writes from drag and resize commits. Coalesces
# bursts of writes to durable storage; the in-memory state and change
# notifications are never delayed. "0s" disables debouncing.
# Examples: "250ms", "1s"
debounce = "250ms"

# Count of initial sync attempts before falling back to locally cached
# preferences.
sync_attempts = 3

# Base backoff between failed sync attempts. The wait grows linearly:
# base after the first failure, twice the base after the second.
# Examples: "500ms", "1s"
sync_backoff = "500ms"

# ==============================================================================
# Logging
# ==============================================================================

[log]

# Logging verbosity level.
# Options: "error", "warn", "info", "debug", "trace"
level = "info"
"#;

// ---------------------------------------------------------------------------
// File creation functions
// ---------------------------------------------------------------------------

/// Creates (or force-overwrites) the default config file.
///
/// - If the file exists and `force` is `false`, returns
///   `ConfigError::AlreadyExists`.
/// - If the file exists and `force` is `true`, backs it up to
///   `.toml.backup` first.
/// - Returns the path where the config was written.
pub fn create_default_config(force: bool) -> Result<PathBuf, ConfigError> {
    let path = xdg::config_path();

    if path.exists() {
        if !force {
            return Err(ConfigError::AlreadyExists { path });
        }
        let backup_path = path.with_extension("toml.backup");
        fs::rename(&path, &backup_path).map_err(|e| ConfigError::WriteError {
            path: backup_path.clone(),
            source: e,
        })?;
        tracing::info!("Backed up existing config to {}", backup_path.display());
    }

    write_default_config(&path)?;
    Ok(path)
}

/// Writes the default template to `path`, creating parent dirs and
/// setting 0600 permissions.
fn write_default_config(path: &PathBuf) -> Result<(), ConfigError> {
    xdg::ensure_config_dir().map_err(|e| ConfigError::WriteError {
        path: path.clone(),
        source: e,
    })?;

    fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(|e| ConfigError::WriteError {
        path: path.clone(),
        source: e,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
            ConfigError::WriteError {
                path: path.clone(),
                source: e,
            }
        })?;
    }

    Ok(())
}
