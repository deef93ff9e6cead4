//! MariaDB SQL dialect.
//!
//! Shares MySQL's lexical rules and upsert form; kept as its own type so
//! the two engines can diverge without touching each other.

use super::helpers;
use super::mysql::regexp;
use super::{DialectProfile, SqlDialect, UpsertParts, MARIADB_PROFILE};
use crate::error::CompileResult;

/// MariaDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MariaDb;

impl SqlDialect for MariaDb {
    fn name(&self) -> &'static str {
        "mariadb"
    }

    fn profile(&self) -> &'static DialectProfile {
        &MARIADB_PROFILE
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
