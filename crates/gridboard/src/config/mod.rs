//! Configuration for the gridboard shell.
//!
//! TOML configuration covers the grid defaults seeded into a fresh
//! preference document, the preference store location and write
//! debounce, the initial sync retry policy, and logging. Everything has
//! a default; a missing config file is not an error.

pub mod default;
pub mod error;
pub mod loader;
pub mod schema;
pub mod xdg;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{Config, GridConfig, LogConfig, LogLevel, StoreConfig};
