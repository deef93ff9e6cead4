//! SQL Server (T-SQL) dialect.
//!
//! T-SQL differences from ANSI:
//! - Square bracket identifier quoting (`[name]`)
//! - No BIT literals; uses 1/0
//! - `TOP n` for a plain row count, OFFSET/FETCH (which needs ORDER BY) for ranges
//! - Default collations ignore case; `COLLATE Latin1_General_CS_AS` forces sensitivity
//! - No regular-expression operator
//! - Row locks are table hints, so there is no trailing FOR UPDATE
//! - Upserts are MERGE statements terminated by `;`

use super::helpers;
use super::{DialectProfile, Limit, Pagination, SqlDialect, UpsertParts, SQLSERVER_PROFILE};
use crate::error::{CompileError, CompileResult};

/// SQL Server dialect.
#[derive(Debug, Clone, Copy)]
pub struct SqlServer;

impl SqlDialect for SqlServer {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn profile(&self) -> &'static DialectProfile {
        &SQLSERVER_PROFILE
    }

    fn force_case_sensitive(&self, column: &str) -> String {
        helpers::case_sensitive_by_marker(self.profile(), column)
    }

    fn like_ignore_case(&self, column: &str, pattern: &str) -> String {
        helpers::like_plain(column, pattern)
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

    fn emit_pagination(&self, limit: Limit, _has_order_by: bool) -> Option<Pagination> {
        match limit {
            Limit::None => None,
            Limit::Count(count) => Some(Pagination::Top(format!("TOP {}", count))),
            Limit::Range { offset, count } => Some(helpers::offset_fetch(offset, count)),
        }
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn for_update(&self) -> Option<&'static str> {
        None
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_sqlserver(name)
    }

    fn emit_upsert(&self, parts: &UpsertParts) -> CompileResult<String> {
        Ok(format!("{};", helpers::upsert_merge(parts, " AS ", "")))
    }
}
