//! SQLite dialect.
//!
//! SQLite differences:
//! - BINARY collation by default, `COLLATE NOCASE` to ignore case
//! - Booleans are integers
//! - No REGEXP unless an extension registers one
//! - No FULL OUTER JOIN before 3.39; treated as unsupported
//! - No row locking
//! - ON CONFLICT upserts and REPLACE INTO

use super::helpers;
use super::{DialectProfile, SqlDialect, UpsertParts, SQLITE_PROFILE};
use crate::error::{CompileError, CompileResult};

/// SQLite dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn profile(&self) -> &'static DialectProfile {
        &SQLITE_PROFILE
    }

    fn force_case_sensitive(&self, column: &str) -> String {
        column.to_string()
    }

    fn like_ignore_case(&self, column: &str, pattern: &str) -> String {
        helpers::like_collate(self.profile(), column, pattern)
    }

    fn regex_match(
        &self,
        _column: &str,
        _pattern: &str,
        ignore_case: bool,
    ) -> CompileResult<String> {
        let op = if ignore_case { "iregex" } else { "regex" };
        Err(CompileError::unsupported(self.name(), format!("Operator `{}`", op)))
    }

    fn supports_full_outer_join(&self) -> bool {
        false
    }

    fn for_update(&self) -> Option<&'static str> {
        None
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_sqlite(name)
    }

    fn supports_replace(&self) -> bool {
        true
    }

    fn emit_upsert(&self, parts: &UpsertParts) -> CompileResult<String> {
        Ok(helpers::upsert_on_conflict(parts))
    }
}
