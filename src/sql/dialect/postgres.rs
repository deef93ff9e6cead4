//! PostgreSQL dialect.
//!
//! Postgres is close to ANSI; the differences that matter here:
//! - Case-sensitive comparisons, so `bin_` operators need no cast
//! - `ILIKE` for case-insensitive matching, `~`/`~*` for regex
//! - ON CONFLICT (...) DO UPDATE for upserts

use super::helpers;
use super::{DialectProfile, SqlDialect, UpsertParts, POSTGRES_PROFILE};
use crate::error::CompileResult;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn profile(&self) -> &'static DialectProfile {
        &POSTGRES_PROFILE
    }

    /// Comparisons are already case-sensitive here.
    fn force_case_sensitive(&self, column: &str) -> String {
        column.to_string()
    }

    fn like_ignore_case(&self, column: &str, pattern: &str) -> String {
        helpers::like_ilike(column, pattern)
    }

    fn regex_match(
        &self,
        column: &str,
        pattern: &str,
        ignore_case: bool,
    ) -> CompileResult<String> {
        Ok(tilde(column, pattern, ignore_case))
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_postgres(name)
    }

    fn emit_upsert(&self, parts: &UpsertParts) -> CompileResult<String> {
        Ok(helpers::upsert_on_conflict(parts))
    }
}

/// POSIX regex match: `~` or `~*`.
pub(super) fn tilde(column: &str, pattern: &str, ignore_case: bool) -> String {
    let op = if ignore_case { "~*" } else { "~" };
    format!("{} {} {}", column, op, pattern)
}
