//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - Backslash escapes inside string literals
//! - Boolean is TINYINT(1), returns 1/0
//! - Default collations ignore case; `BINARY col` forces sensitivity
//! - `REGEXP` for regular expressions
//! - No FULL OUTER JOIN
//! - ON DUPLICATE KEY UPDATE and REPLACE INTO for upserts

use super::helpers;
use super::{DialectProfile, SqlDialect, UpsertParts, MYSQL_PROFILE};
use crate::error::CompileResult;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn profile(&self) -> &'static DialectProfile {
        &MYSQL_PROFILE
    }

    fn force_case_sensitive(&self, column: &str) -> String {
        helpers::case_sensitive_by_marker(self.profile(), column)
    }

    fn like_ignore_case(&self, column: &str, pattern: &str) -> String {
        helpers::like_plain(column, pattern)
    }

    fn regex_match(
        &self,
        column: &str,
        pattern: &str,
        ignore_case: bool,
    ) -> CompileResult<String> {
        Ok(regexp(column, pattern, ignore_case))
    }

    fn supports_full_outer_join(&self) -> bool {
        false
    }

    // Uses default emit_pagination (LIMIT ... OFFSET ...)

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_mysql(name)
    }

    fn supports_replace(&self) -> bool {
        true
    }

    fn emit_upsert(&self, parts: &UpsertParts) -> CompileResult<String> {
        Ok(helpers::upsert_on_duplicate_key(parts))
    }
}

/// `col regexp 'p'`, lowering both sides when case must be ignored.
pub(super) fn regexp(column: &str, pattern: &str, ignore_case: bool) -> String {
    if ignore_case {
        format!("LOWER({}) regexp LOWER({})", column, pattern)
    } else {
        format!("{} regexp {}", column, pattern)
    }
}
