//! TOML-based configuration for Quarry.
//!
//! Supports a config file (quarry.toml) describing compiler defaults and the
//! schema to register.
//!
//! Example configuration:
//! ```toml
//! [compiler]
//! dialect = "postgres"
//! alias_prefix = "orm_"
//! link = "."
//!
//! [[tables]]
//! name = "table1"
//! columns = ["id", "name", "t2id"]
//! primary_key = "id"
//!
//!   [[tables.joins]]
//!   tag = "tb2"
//!   kind = "left"
//!   on = [["t2id", "id"]]
//!   target = "Table2"
//!
//! [[tables]]
//! name = "table2"
//! model = "Table2"
//! columns = ["id", "title"]
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CompileError;
use crate::schema::{JoinDeclaration, JoinKind, SchemaRegistry, TableSchema};
use crate::sql::{CompilerOptions, Dialect};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "QUARRY_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid schema: {0}")]
    Schema(#[from] CompileError),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub compiler: CompilerSettings,
    pub tables: Vec<TableSettings>,
}

/// `[compiler]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    pub dialect: Dialect,
    /// Prefix of derived join aliases.
    pub alias_prefix: String,
    /// Link string used in output names of joined columns.
    pub link: String,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        let options = CompilerOptions::default();
        Self {
            dialect: options.dialect,
            alias_prefix: options.alias_prefix,
            link: options.link,
        }
    }
}

/// One `[[tables]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TableSettings {
    pub name: String,
    /// Defaults to the table name.
    #[serde(default)]
    pub model: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub unique_keys: Vec<String>,
    #[serde(default)]
    pub joins: Vec<JoinSettings>,
}

/// One `[[tables.joins]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JoinSettings {
    pub tag: String,
    #[serde(default)]
    pub kind: JoinKind,
    #[serde(default)]
    pub on: Vec<(String, String)>,
    /// Model of the joined table.
    pub target: String,
}

impl TableSettings {
    fn schema(&self) -> TableSchema {
        let mut schema = TableSchema::new(&self.name, self.columns.iter().cloned())
            .with_unique_keys(self.unique_keys.iter().cloned());
        if let Some(model) = &self.model {
            schema = schema.with_model(model);
        }
        if let Some(pk) = &self.primary_key {
            schema = schema.with_primary_key(pk);
        }
        schema
    }
}

impl JoinSettings {
    fn declaration(&self, table: &str) -> JoinDeclaration {
        self.on.iter().fold(
            JoinDeclaration::new(table, &self.tag, self.kind, &self.target),
            |decl, (source, target)| decl.on(source, target),
        )
    }
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        tracing::debug!(path = %path.display(), "loading settings");
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. `explicit`, when given
    /// 2. Environment variable `QUARRY_CONFIG`
    /// 3. `./quarry.toml`
    /// 4. `~/.config/quarry/config.toml`
    ///
    /// Falls back to defaults (no tables) when nothing is found.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("quarry.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("quarry").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Settings::default())
    }

    /// Compiler options from the `[compiler]` section.
    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions {
            dialect: self.compiler.dialect,
            alias_prefix: self.compiler.alias_prefix.clone(),
            link: self.compiler.link.clone(),
        }
    }

    /// Register every table, then every join, and build the registry.
    pub fn registry(&self) -> Result<SchemaRegistry, SettingsError> {
        let mut registry = SchemaRegistry::new();
        for table in &self.tables {
            registry.register_table(table.schema())?;
        }
        for table in &self.tables {
            for join in &table.joins {
                registry.register_join(join.declaration(&table.name))?;
            }
        }
        registry.build()?;
        Ok(registry)
    }
}
