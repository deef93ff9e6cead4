//! OpenGauss dialect.
//!
//! Postgres-derived; differs in its upsert spelling, which borrows MySQL's
//! `ON DUPLICATE KEY UPDATE` but reads incoming values from `EXCLUDED`.

use super::helpers;
use super::postgres::tilde;
use super::{DialectProfile, SqlDialect, UpsertParts, OPENGAUSS_PROFILE};
use crate::error::CompileResult;

/// OpenGauss dialect.
#[derive(Debug, Clone, Copy)]
pub struct OpenGauss;

impl SqlDialect for OpenGauss {
    fn name(&self) -> &'static str {
        "opengauss"
    }

    fn profile(&self) -> &'static DialectProfile {
        &OPENGAUSS_PROFILE
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
        Ok(helpers::upsert_on_duplicate_key_excluded(parts))
    }
}
