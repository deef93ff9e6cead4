//! ClickHouse dialect.
//!
//! ClickHouse differences:
//! - Backtick quoting and backslash escapes, like MySQL
//! - `ILIKE` and `match()` (RE2) for pattern matching
//! - No row locking
//! - No keyed upsert; ReplacingMergeTree deduplicates on merge instead

use super::helpers;
use super::{DialectProfile, SqlDialect, UpsertParts, CLICKHOUSE_PROFILE};
use crate::error::{CompileError, CompileResult};

/// ClickHouse dialect.
#[derive(Debug, Clone, Copy)]
pub struct ClickHouse;

impl SqlDialect for ClickHouse {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn profile(&self) -> &'static DialectProfile {
        &CLICKHOUSE_PROFILE
    }

    fn force_case_sensitive(&self, column: &str) -> String {
        helpers::case_sensitive_by_marker(self.profile(), column)
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
        if ignore_case {
            Ok(format!("match({}, concat('(?i)', {}))", column, pattern))
        } else {
            Ok(format!("match({}, {})", column, pattern))
        }
    }

    fn for_update(&self) -> Option<&'static str> {
        None
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_clickhouse(name)
    }

    fn emit_upsert(&self, _parts: &UpsertParts) -> CompileResult<String> {
        Err(CompileError::unsupported(self.name(), "Keyed upsert"))
    }
}
