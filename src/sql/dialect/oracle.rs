//! Oracle dialect.
//!
//! Oracle differences:
//! - Table aliases take no `AS`
//! - Timestamps go through `TO_DATE(..., 'yyyy-mm-dd hh24:mi:ss')`
//! - `ROWNUM <= n` for an unordered row count, OFFSET/FETCH otherwise
//! - `REGEXP_LIKE` for regular expressions, `LOWER()` for case folding
//! - Upserts are MERGE statements sourced from DUAL

use super::helpers;
use super::{DialectProfile, Limit, Pagination, SqlDialect, UpsertParts, ORACLE_PROFILE};
use crate::error::CompileResult;

/// Oracle dialect.
#[derive(Debug, Clone, Copy)]
pub struct Oracle;

impl SqlDialect for Oracle {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn profile(&self) -> &'static DialectProfile {
        &ORACLE_PROFILE
    }

    fn format_timestamp(&self, text: &str) -> String {
        format!(
            "TO_DATE({}, 'yyyy-mm-dd hh24:mi:ss')",
            self.quote_string(text)
        )
    }

    fn table_alias_keyword(&self) -> &'static str {
        " "
    }

    fn force_case_sensitive(&self, column: &str) -> String {
        column.to_string()
    }

    fn like_ignore_case(&self, column: &str, pattern: &str) -> String {
        helpers::like_lower(column, pattern)
    }

    fn regex_match(
        &self,
        column: &str,
        pattern: &str,
        ignore_case: bool,
    ) -> CompileResult<String> {
        if ignore_case {
            Ok(format!("REGEXP_LIKE({}, {}, 'i')", column, pattern))
        } else {
            Ok(format!("REGEXP_LIKE({}, {})", column, pattern))
        }
    }

    fn emit_pagination(&self, limit: Limit, has_order_by: bool) -> Option<Pagination> {
        match limit {
            Limit::None => None,
            // ROWNUM is assigned before ORDER BY, so it only works unordered.
            Limit::Count(count) if !has_order_by => {
                Some(Pagination::Predicate(format!("ROWNUM <= {}", count)))
            }
            Limit::Count(count) => Some(helpers::offset_fetch(0, count)),
            Limit::Range { offset, count } => Some(helpers::offset_fetch(offset, count)),
        }
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_oracle(name)
    }

    fn emit_upsert(&self, parts: &UpsertParts) -> CompileResult<String> {
        Ok(helpers::upsert_merge(parts, " ", " FROM DUAL"))
    }
}
