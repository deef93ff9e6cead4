//! SQL generation module.
//!
//! Compiles query descriptors into dialect-specific SQL text:
//!
//! - [`column`] - field-string parsing and column/join resolution
//! - [`condition`] - the condition DSL and its WHERE/HAVING compiler
//! - [`operator`] - operator suffixes (`__gt`, `__in`, `__startswith`, ...)
//! - [`value`] - operand values and literal formatting
//! - [`query`] - SELECT descriptors and the query assembler
//! - [`dml`] - INSERT, upsert, REPLACE, UPDATE and DELETE
//! - [`dialect`] - SQL dialect implementations

pub mod column;
pub mod condition;
pub mod dialect;
pub mod dml;
pub mod operator;
pub mod query;
pub mod value;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use column::{ColumnDescriptor, ColumnReference};
pub use condition::{Conditions, Linker, Operand};
pub use dialect::{Dialect, DialectProfile, Limit, SqlDialect};
pub use dml::{Delete, Insert, Replace, Row, Update, Upsert};
pub use operator::Operator;
pub use query::{CompiledQuery, Compiler, CompilerOptions, Select};
pub use value::{Sql, Value};
