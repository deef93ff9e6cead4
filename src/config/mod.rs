//! Configuration module for Quarry.
//!
//! Loads compiler defaults and the table/join schema from TOML.

mod settings;

pub use settings::{CompilerSettings, JoinSettings, Settings, SettingsError, TableSettings};
