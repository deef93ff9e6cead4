//! Identifier policy for tables, columns and join tags.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CompileError, CompileResult};

static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9_-]{1,64}$").unwrap());

/// Whether `name` satisfies `[a-z0-9_-]{1,64}`.
pub fn is_valid(name: &str) -> bool {
    IDENT_RE.is_match(name)
}

/// Validate `name`, returning it unchanged on success.
pub fn validate(name: &str) -> CompileResult<&str> {
    if is_valid(name) {
        Ok(name)
    } else {
        Err(CompileError::InvalidIdentifier(name.to_string()))
    }
}
