//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use super::{CaseMarker, DialectProfile, Limit, Pagination, UpsertParts};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with the profile's quote pair, doubling the closing quote.
/// Used by: All dialects
pub fn quote_with(profile: &DialectProfile, ident: &str) -> String {
    let close = profile.ident_close;
    let mut out = String::with_capacity(ident.len() + 2);
    out.push(profile.ident_open);
    for c in ident.chars() {
        if c == close {
            out.push(close);
        }
        out.push(c);
    }
    out.push(close);
    out
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote a string literal.
///
/// Backslash-escaping engines escape both the backslash and the quote;
/// the rest double the quote and leave backslashes alone.
/// Used by: All dialects
pub fn quote_string(profile: &DialectProfile, s: &str) -> String {
    let quote = profile.string_quote;
    let escape = profile.escape;
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        if c == quote || (c == escape && escape != quote) {
            out.push(escape);
        }
        out.push(c);
    }
    out.push(quote);
    out
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as numeric 1/0.
/// Used by: every dialect (trait default)
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

// =============================================================================
// Case Folding
// =============================================================================

/// Apply the profile's case-sensitivity marker to a column.
/// Used by: MySQL, MariaDB, ClickHouse (`BINARY col`), SQL Server (`col COLLATE ...`)
pub fn case_sensitive_by_marker(profile: &DialectProfile, column: &str) -> String {
    match profile.case_marker {
        CaseMarker::BinaryPrefix(marker) => format!("{} {}", marker, column),
        CaseMarker::CollateSuffix(collation) => format!("{} COLLATE {}", column, collation),
        CaseMarker::IgnoreCase(_) | CaseMarker::None => column.to_string(),
    }
}

/// Plain LIKE; the engine's default collation already ignores case.
/// Used by: MySQL, MariaDB, SQL Server
pub fn like_plain(column: &str, pattern: &str) -> String {
    format!("{} like {}", column, pattern)
}

/// ILIKE operator.
/// Used by: Postgres, OpenGauss, ClickHouse
pub fn like_ilike(column: &str, pattern: &str) -> String {
    format!("{} ilike {}", column, pattern)
}

/// LIKE with an ignore-case collation appended.
/// Used by: SQLite
pub fn like_collate(profile: &DialectProfile, column: &str, pattern: &str) -> String {
    match profile.case_marker {
        CaseMarker::IgnoreCase(collation) => {
            format!("{} like {} COLLATE {}", column, pattern, collation)
        }
        _ => like_lower(column, pattern),
    }
}

/// LOWER() on both sides.
/// Used by: Oracle, and as the regex fallback for MySQL/MariaDB
pub fn like_lower(column: &str, pattern: &str) -> String {
    format!("LOWER({}) like LOWER({})", column, pattern)
}

// =============================================================================
// Pagination
// =============================================================================

/// Emit LIMIT n [OFFSET m].
/// Used by: MySQL, MariaDB, Postgres, OpenGauss, SQLite, ClickHouse
pub fn limit_offset_standard(limit: Limit) -> Option<Pagination> {
    match limit {
        Limit::None => None,
        Limit::Count(count) => Some(Pagination::Tail(format!("LIMIT {}", count))),
        Limit::Range { offset, count } => Some(Pagination::Tail(format!(
            "LIMIT {} OFFSET {}",
            count, offset
        ))),
    }
}

/// Emit OFFSET ... ROWS FETCH NEXT ... ROWS ONLY.
/// Used by: SQL Server, Oracle
/// Note: SQL Server requires an ORDER BY clause for this form
pub fn offset_fetch(offset: u64, count: u64) -> Pagination {
    Pagination::Tail(format!(
        "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
        offset, count
    ))
}

// =============================================================================
// Function Remapping
// =============================================================================

/// Remap functions for MySQL and MariaDB.
pub fn remap_function_mysql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "STRFTIME" => Some("DATE_FORMAT"),
        "TO_CHAR" => Some("DATE_FORMAT"),
        "NVL" => Some("IFNULL"),
        "ISNULL" => Some("IFNULL"),
        "LEN" => Some("CHAR_LENGTH"),
        _ => None,
    }
}

/// Remap functions for SQL Server.
pub fn remap_function_sqlserver(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LENGTH" => Some("LEN"),
        "CHAR_LENGTH" => Some("LEN"),
        "SUBSTR" => Some("SUBSTRING"),
        "NOW" => Some("GETDATE"),
        "STRFTIME" => Some("FORMAT"),
        "TO_CHAR" => Some("FORMAT"),
        "DATE_FORMAT" => Some("FORMAT"),
        "NVL" => Some("ISNULL"),
        "IFNULL" => Some("ISNULL"),
        _ => None,
    }
}

/// Remap functions for Postgres and OpenGauss.
pub fn remap_function_postgres(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "STRFTIME" => Some("TO_CHAR"),
        "DATE_FORMAT" => Some("TO_CHAR"),
        "NVL" => Some("COALESCE"),
        "IFNULL" => Some("COALESCE"),
        "ISNULL" => Some("COALESCE"),
        "LEN" => Some("LENGTH"),
        _ => None,
    }
}

/// Remap functions for SQLite.
pub fn remap_function_sqlite(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "NVL" => Some("IFNULL"),
        "ISNULL" => Some("IFNULL"),
        "LEN" => Some("LENGTH"),
        "CHAR_LENGTH" => Some("LENGTH"),
        "SUBSTRING" => Some("SUBSTR"),
        _ => None,
    }
}

/// Remap functions for Oracle.
pub fn remap_function_oracle(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "IFNULL" => Some("NVL"),
        "ISNULL" => Some("NVL"),
        "LEN" => Some("LENGTH"),
        "CHAR_LENGTH" => Some("LENGTH"),
        "SUBSTRING" => Some("SUBSTR"),
        "DATE_FORMAT" => Some("TO_CHAR"),
        "STRFTIME" => Some("TO_CHAR"),
        _ => None,
    }
}

/// Remap functions for ClickHouse.
pub fn remap_function_clickhouse(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "NVL" => Some("COALESCE"),
        "ISNULL" => Some("COALESCE"),
        "LEN" => Some("LENGTH"),
        "CHAR_LENGTH" => Some("LENGTH"),
        "SUBSTR" => Some("SUBSTRING"),
        _ => None,
    }
}

// =============================================================================
// Upsert
// =============================================================================

/// `INSERT INTO t (a,b) VALUES (1,2)`.
/// Used by: All dialects, as the prefix of non-MERGE upserts
pub fn insert_values(verb: &str, parts: &UpsertParts) -> String {
    format!(
        "{} INTO {} ({}) VALUES ({})",
        verb,
        parts.table,
        parts.columns.join(","),
        parts.values.join(",")
    )
}

/// `... ON DUPLICATE KEY UPDATE b=VALUES(b)`.
/// Used by: MySQL, MariaDB
pub fn upsert_on_duplicate_key(parts: &UpsertParts) -> String {
    let assignments = if parts.updates.is_empty() {
        // Nothing to overwrite: a self-assignment keeps the row untouched.
        let key = &parts.keys[0];
        format!("{}={}", key, key)
    } else {
        parts
            .updates
            .iter()
            .map(|c| format!("{}=VALUES({})", c, c))
            .collect::<Vec<_>>()
            .join(",")
    };
    format!(
        "{} ON DUPLICATE KEY UPDATE {}",
        insert_values("INSERT", parts),
        assignments
    )
}

/// `... ON CONFLICT (k) DO UPDATE SET b=EXCLUDED.b`.
/// Used by: Postgres, SQLite
pub fn upsert_on_conflict(parts: &UpsertParts) -> String {
    let action = if parts.updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", excluded_assignments(parts))
    };
    format!(
        "{} ON CONFLICT ({}) {}",
        insert_values("INSERT", parts),
        parts.keys.join(","),
        action
    )
}

/// `... ON DUPLICATE KEY UPDATE b=EXCLUDED.b`.
/// Used by: OpenGauss
pub fn upsert_on_duplicate_key_excluded(parts: &UpsertParts) -> String {
    let action = if parts.updates.is_empty() {
        "NOTHING".to_string()
    } else {
        excluded_assignments(parts)
    };
    format!(
        "{} ON DUPLICATE KEY UPDATE {}",
        insert_values("INSERT", parts),
        action
    )
}

fn excluded_assignments(parts: &UpsertParts) -> String {
    parts
        .updates
        .iter()
        .map(|c| format!("{}=EXCLUDED.{}", c, c))
        .collect::<Vec<_>>()
        .join(",")
}

/// MERGE against a one-row source built from the literal values.
///
/// `alias_kw` is placed before the `tgt`/`src` aliases and `source_from`
/// completes the source SELECT (`" FROM DUAL"` on Oracle).
/// Used by: SQL Server, Oracle
pub fn upsert_merge(parts: &UpsertParts, alias_kw: &str, source_from: &str) -> String {
    let source = parts
        .columns
        .iter()
        .zip(&parts.values)
        .map(|(c, v)| format!("{} AS {}", v, c))
        .collect::<Vec<_>>()
        .join(",");
    let on = parts
        .keys
        .iter()
        .map(|k| format!("tgt.{}=src.{}", k, k))
        .collect::<Vec<_>>()
        .join(" AND ");

    let mut sql = format!(
        "MERGE INTO {}{}tgt USING (SELECT {}{}){}src ON ({})",
        parts.table, alias_kw, source, source_from, alias_kw, on
    );
    if !parts.updates.is_empty() {
        let set = parts
            .updates
            .iter()
            .map(|c| format!("tgt.{}=src.{}", c, c))
            .collect::<Vec<_>>()
            .join(",");
        sql.push_str(&format!(" WHEN MATCHED THEN UPDATE SET {}", set));
    }
    let src_values = parts
        .columns
        .iter()
        .map(|c| format!("src.{}", c))
        .collect::<Vec<_>>()
        .join(",");
    sql.push_str(&format!(
        " WHEN NOT MATCHED THEN INSERT ({}) VALUES ({})",
        parts.columns.join(","),
        src_values
    ));
    sql
}
