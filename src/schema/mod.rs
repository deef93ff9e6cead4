//! Table schemas and join declarations.
//!
//! Schemas are declared explicitly through a small builder API and handed
//! to a [`SchemaRegistry`], which compiles the join declarations into a
//! lookup keyed by `(table, tag)`:
//!
//! ```ignore
//! let mut registry = SchemaRegistry::new();
//! registry.register_table(TableSchema::new("table1", ["id", "name", "t2id"]).with_primary_key("id"))?;
//! registry.register_table(TableSchema::new("table2", ["id", "title"]).with_model("Table2"))?;
//! registry.register_join(JoinDeclaration::new("table1", "tb2", JoinKind::Left, "Table2").on("t2id", "id"))?;
//! registry.build()?;
//! ```

mod graph;

pub use graph::{JoinEntry, SchemaRegistry};

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// How a joined table is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Left,
    Right,
    Inner,
    Full,
    Natural,
}

impl JoinKind {
    /// SQL keyword(s) that introduce this join.
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Natural => "NATURAL JOIN",
        }
    }

    /// Natural joins are the only kind that takes no ON pairs.
    pub fn requires_on(&self) -> bool {
        !matches!(self, JoinKind::Natural)
    }
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::Inner => "inner",
            JoinKind::Full => "full",
            JoinKind::Natural => "natural",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for JoinKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(JoinKind::Left),
            "right" => Ok(JoinKind::Right),
            "inner" => Ok(JoinKind::Inner),
            "full" => Ok(JoinKind::Full),
            "natural" => Ok(JoinKind::Natural),
            other => Err(CompileError::invalid_field(other, "unknown join kind")),
        }
    }
}

/// A registered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    /// Struct id that join declarations use to name this table as a target.
    pub model: String,
    /// Column names in declaration order.
    pub columns: Vec<String>,
    pub primary_key: Option<String>,
    pub unique_keys: Vec<String>,
}

impl TableSchema {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        Self {
            model: name.clone(),
            name,
            columns: columns.into_iter().map(Into::into).collect(),
            primary_key: None,
            unique_keys: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = Some(key.into());
        self
    }

    pub fn with_unique_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// A join as declared, before its target model is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinDeclaration {
    pub table: String,
    pub tag: String,
    pub kind: JoinKind,
    /// `(source column, target column)` equality pairs.
    pub on: Vec<(String, String)>,
    pub target_model: String,
}

impl JoinDeclaration {
    pub fn new(
        table: impl Into<String>,
        tag: impl Into<String>,
        kind: JoinKind,
        target_model: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            tag: tag.into(),
            kind,
            on: Vec::new(),
            target_model: target_model.into(),
        }
    }

    /// Add an ON equality pair.
    pub fn on(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.on.push((source.into(), target.into()));
        self
    }
}
