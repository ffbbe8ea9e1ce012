//! Gridboard - CLI entry point
//!
//! Inspects and manages the persisted dashboard preference document
//! from the command line: show the normalized layout, list and edit
//! preset slots, dump the raw document, and manage the config file.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gridboard::config::{default, loader::ConfigLoader, xdg, Config};
use gridboard::identity::StaticIdentity;
use gridboard::prefs::{FileBackend, PreferenceStore};
use gridboard::presets::PresetError;
use gridboard::sync::{EditingGuard, SyncEngine};
use gridboard::{PresetType, PRESET_SLOTS};
use tracing_subscriber::{fmt, EnvFilter};
use widget_catalog::Catalog;

/// Gridboard dashboard shell
#[derive(Parser)]
#[command(name = "gridboard")]
#[command(version, about = "Personalizable dashboard shell")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the gridboard CLI
#[derive(Subcommand)]
enum Commands {
    /// Show the normalized dashboard layout
    Show,

    /// List the nine preset slots
    Presets,

    /// Dump the raw preference document as JSON
    Dump,

    /// Manage one preset slot
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },

    /// Manage configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Actions for the `preset` subcommand. Slots are numbered 1 through 9.
#[derive(Subcommand)]
enum PresetAction {
    /// Load a preset into the live layout
    Load {
        /// Slot number (1-9)
        slot: usize,
    },
    /// Empty a preset slot
    Clear {
        /// Slot number (1-9)
        slot: usize,
    },
    /// Write an all-disabled blank preset into a slot
    Blank {
        /// Slot number (1-9)
        slot: usize,
    },
    /// Copy one slot into another
    Copy {
        /// Source slot number (1-9)
        source: usize,
        /// Target slot number (1-9)
        target: usize,
    },
}

/// Actions for the `config` subcommand.
#[derive(Subcommand)]
enum ConfigAction {
    /// Create default configuration file
    Init {
        /// Overwrite existing configuration (creates backup)
        #[arg(long)]
        force: bool,
    },
    /// Show configuration file path
    Path,
    /// Validate configuration file
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConfigLoader::load_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    match cli.command {
        Commands::Show => run_async(async move {
            let (engine, _store) = open_engine(&config).await;
            print_layout(&engine);
            ExitCode::SUCCESS
        }),
        Commands::Presets => run_async(async move {
            let (engine, _store) = open_engine(&config).await;
            print_presets(&engine);
            ExitCode::SUCCESS
        }),
        Commands::Dump => run_async(async move {
            let (_engine, store) = open_engine(&config).await;
            let doc = store.snapshot().await;
            match serde_json::to_string_pretty(&doc.to_value()) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: failed to serialize document: {}", e);
                    ExitCode::FAILURE
                }
            }
        }),
        Commands::Preset { action } => run_async(async move {
            let (mut engine, store) = open_engine(&config).await;
            let result = match action {
                PresetAction::Load { slot } => match slot_index(slot) {
                    Some(index) => engine.load_preset(index).await.map(|_| {
                        println!("Loaded preset {}", slot);
                    }),
                    None => return bad_slot(slot),
                },
                PresetAction::Clear { slot } => match slot_index(slot) {
                    Some(index) => engine.clear_preset(index).await.map(|_| {
                        println!("Cleared preset {}", slot);
                    }),
                    None => return bad_slot(slot),
                },
                PresetAction::Blank { slot } => match slot_index(slot) {
                    Some(index) => engine.create_blank_preset(index).await.map(|_| {
                        println!("Created blank preset {}", slot);
                    }),
                    None => return bad_slot(slot),
                },
                PresetAction::Copy { source, target } => {
                    match (slot_index(source), slot_index(target)) {
                        (Some(from), Some(to)) => engine.copy_preset(from, to).await.map(|_| {
                            println!("Copied preset {} to {}", source, target);
                        }),
                        (None, _) => return bad_slot(source),
                        (_, None) => return bad_slot(target),
                    }
                }
            };
            if let Err(e) = result {
                // Store errors carry 0-based indices; the CLI speaks 1-based.
                let msg = match e {
                    PresetError::SlotOutOfRange(i) => {
                        format!("slot {} is out of range (1-{})", i + 1, PRESET_SLOTS)
                    }
                    PresetError::EmptySlot(i) => format!("preset {} is empty", i + 1),
                    PresetError::NoEnabledWidgets(i) => {
                        format!("preset {} has no enabled widgets", i + 1)
                    }
                };
                eprintln!("Error: {}", msg);
                return ExitCode::FAILURE;
            }
            // Make sure the document hits disk before the process exits.
            if let Err(e) = store.flush().await {
                eprintln!("Error: failed to persist document: {}", e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }),
        Commands::Config { action } => {
            let result = match action {
                ConfigAction::Init { force } => match default::create_default_config(force) {
                    Ok(path) => {
                        println!("Created configuration at {}", path.display());
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                ConfigAction::Path => {
                    println!("{}", xdg::config_path().display());
                    Ok(())
                }
                ConfigAction::Validate => match ConfigLoader::load_default() {
                    Ok(config) => {
                        println!("Configuration is valid");
                        println!("{config:#?}");
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
            };
            if let Err(e) = result {
                eprintln!("Config error: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Reads the `GRIDBOARD_LOG` environment variable for filter directives
/// and falls back to the configured log level. Output goes to stderr so
/// command output on stdout stays clean.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_env("GRIDBOARD_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_filter()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_async<F>(future: F) -> ExitCode
where
    F: std::future::Future<Output = ExitCode>,
{
    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    rt.block_on(future)
}

/// Opens the preference document and runs a fully initialized engine
/// over it for this invocation.
async fn open_engine(config: &Config) -> (SyncEngine, PreferenceStore) {
    let backend = Arc::new(FileBackend::with_legacy(
        config.document_path(),
        xdg::legacy_layout_path(),
    ));
    let store = PreferenceStore::new(backend);
    let mut engine = SyncEngine::new(
        store.session(),
        Arc::new(Catalog::builtin()),
        Arc::new(StaticIdentity::anonymous()),
        EditingGuard::new(),
        config.engine_options(),
    );
    engine.initialize().await;
    (engine, store)
}

/// Converts a 1-based CLI slot number into a store index.
fn slot_index(slot: usize) -> Option<usize> {
    slot.checked_sub(1).filter(|i| *i < PRESET_SLOTS)
}

fn bad_slot(slot: usize) -> ExitCode {
    eprintln!("Error: slot {} is out of range (1-{})", slot, PRESET_SLOTS);
    ExitCode::FAILURE
}

fn print_layout(engine: &SyncEngine) {
    println!(
        "{:<18} {:<8} {:>3} {:>3} {:>3} {:>3}  {}",
        "ID", "STATE", "X", "Y", "W", "H", "TITLE"
    );
    for widget in engine.layout() {
        println!(
            "{:<18} {:<8} {:>3} {:>3} {:>3} {:>3}  {}",
            widget.id,
            if widget.enabled { "on" } else { "off" },
            widget.x,
            widget.y,
            widget.w,
            widget.h,
            widget.title,
        );
    }
    let geometry = engine.geometry();
    println!(
        "\nGrid: {} columns, {}px rows",
        geometry.columns, geometry.cell_height
    );
    if let Some(index) = engine.active_preset() {
        println!("Active preset: {}", index + 1);
    }
}

fn print_presets(engine: &SyncEngine) {
    for (i, slot) in engine.presets().slots().iter().enumerate() {
        match slot {
            Some(preset) => {
                let enabled = preset.layout.iter().filter(|w| w.enabled).count();
                let mode = match preset.preset_type {
                    PresetType::Grid => "grid",
                    PresetType::Fullscreen => "fullscreen",
                };
                println!("{}. {} ({} widgets, {})", i + 1, preset.name, enabled, mode);
            }
            None => println!("{}. (empty)", i + 1),
        }
    }
}
