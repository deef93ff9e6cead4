//! # Quarry
//!
//! A dialect-aware SQL compiler for a tag-based join schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Schema registration (tables, join tags)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [SchemaRegistry::build]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Frozen join graph (petgraph, read-only)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Compiler::compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │  Select descriptor ─► column resolver ─► condition DSL   │
//! │                 ─► dialect rendering                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │        SQL text: full statement, COUNT, WHERE            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use quarry::prelude::*;
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register_table(TableSchema::new("table1", ["id", "name", "t2id"]))?;
//! registry.register_table(TableSchema::new("table2", ["id", "title"]).with_model("Table2"))?;
//! registry.register_join(JoinDeclaration::new("table1", "tb2", JoinKind::Left, "Table2").on("t2id", "id"))?;
//! registry.build()?;
//!
//! let compiler = Compiler::with_dialect(&registry, Dialect::Postgres);
//! let sql = compiler.to_sql(
//!     &Select::from("table1")
//!         .fields(["id", "tb2.title"])
//!         .filter(Conditions::new().with("name__startswith", "a")),
//! )?;
//! ```

pub mod config;
pub mod error;
pub mod ident;
pub mod schema;
pub mod sql;

pub use error::{CompileError, CompileResult, ErrorKind};
pub use schema::{JoinDeclaration, JoinKind, SchemaRegistry, TableSchema};

/// Everything needed to register a schema and compile against it.
pub mod prelude {
    pub use crate::error::{CompileError, CompileResult};
    pub use crate::schema::{JoinDeclaration, JoinKind, SchemaRegistry, TableSchema};
    pub use crate::sql::{
        Compiler, CompilerOptions, Conditions, Delete, Dialect, Insert, Limit, Replace, Row,
        Select, Update, Upsert, Value,
    };
}
