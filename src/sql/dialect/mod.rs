//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for engine differences.
//! Each engine implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting: `` ` `` (MySQL/MariaDB/ClickHouse), `"` (Postgres/OpenGauss/SQLite/Oracle), `[]` (SQL Server)
//! - String escaping: backslash (MySQL/MariaDB/ClickHouse) vs doubled quote
//! - Case folding: `BINARY` prefix, `COLLATE` suffix, `ILIKE`, `LOWER(...)`
//! - Pagination: LIMIT/OFFSET vs TOP vs OFFSET FETCH vs ROWNUM
//! - Upsert: ON DUPLICATE KEY UPDATE vs ON CONFLICT vs MERGE
//!
//! # Usage
//!
//! ```ignore
//! use quarry::sql::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("user");  // "user"
//! ```
//!
//! # Feature Matrix
//!
//! | Feature        | MySQL | MariaDB | SQL Server | Postgres | OpenGauss | SQLite | Oracle | ClickHouse |
//! |----------------|-------|---------|------------|----------|-----------|--------|--------|------------|
//! | FOR UPDATE     | ✓     | ✓       | ❌         | ✓        | ✓         | ❌     | ✓      | ❌         |
//! | FULL JOIN      | ❌    | ❌      | ✓          | ✓        | ✓         | ❌     | ✓      | ✓          |
//! | regex / iregex | ✓     | ✓       | ❌         | ✓        | ✓         | ❌     | ✓      | ✓          |
//! | REPLACE INTO   | ✓     | ✓       | ❌         | ❌       | ❌        | ✓      | ❌     | ❌         |
//! | Upsert         | ✓     | ✓       | MERGE      | ✓        | ✓         | ✓      | MERGE  | ❌         |
//!
//! Unsupported combinations fail with a `DialectError` instead of emitting
//! SQL the engine would reject or silently reinterpret.

mod clickhouse;
pub mod helpers;
mod mariadb;
mod mysql;
pub mod operators;
mod opengauss;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

pub use clickhouse::ClickHouse;
pub use mariadb::MariaDb;
pub use mysql::MySql;
pub use opengauss::OpenGauss;
pub use oracle::Oracle;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use sqlserver::SqlServer;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

// =============================================================================
// Dialect Profile (pure lexical data)
// =============================================================================

/// How an engine's default collation treats letter case, and which marker
/// flips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMarker {
    /// Case-insensitive by default; `BINARY col` forces sensitivity.
    BinaryPrefix(&'static str),
    /// Case-insensitive by default; `col COLLATE <name>` forces sensitivity.
    CollateSuffix(&'static str),
    /// Case-sensitive by default; `COLLATE <name>` makes a match ignore case.
    IgnoreCase(&'static str),
    /// Case-sensitive by default; insensitivity goes through `LOWER()`/`ILIKE`.
    None,
}

/// Static lexical facts about one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectProfile {
    pub engine: &'static str,
    pub ident_open: char,
    pub ident_close: char,
    pub string_quote: char,
    /// Character that escapes a quote (or itself) inside a string literal.
    pub escape: char,
    pub case_marker: CaseMarker,
}

pub const MYSQL_PROFILE: DialectProfile = DialectProfile {
    engine: "mysql",
    ident_open: '`',
    ident_close: '`',
    string_quote: '\'',
    escape: '\\',
    case_marker: CaseMarker::BinaryPrefix("BINARY"),
};

pub const MARIADB_PROFILE: DialectProfile = DialectProfile {
    engine: "mariadb",
    ..MYSQL_PROFILE
};

pub const CLICKHOUSE_PROFILE: DialectProfile = DialectProfile {
    engine: "clickhouse",
    ..MYSQL_PROFILE
};

pub const SQLSERVER_PROFILE: DialectProfile = DialectProfile {
    engine: "sqlserver",
    ident_open: '[',
    ident_close: ']',
    string_quote: '\'',
    escape: '\'',
    case_marker: CaseMarker::CollateSuffix("Latin1_General_CS_AS"),
};

pub const POSTGRES_PROFILE: DialectProfile = DialectProfile {
    engine: "postgres",
    ident_open: '"',
    ident_close: '"',
    string_quote: '\'',
    escape: '\'',
    case_marker: CaseMarker::None,
};

pub const OPENGAUSS_PROFILE: DialectProfile = DialectProfile {
    engine: "opengauss",
    ..POSTGRES_PROFILE
};

pub const SQLITE_PROFILE: DialectProfile = DialectProfile {
    engine: "sqlite",
    case_marker: CaseMarker::IgnoreCase("NOCASE"),
    ..POSTGRES_PROFILE
};

pub const ORACLE_PROFILE: DialectProfile = DialectProfile {
    engine: "oracle",
    ..POSTGRES_PROFILE
};

// =============================================================================
// Pagination
// =============================================================================

/// Row limit requested by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Limit {
    #[default]
    None,
    Count(u64),
    Range { offset: u64, count: u64 },
}

/// Where a dialect's pagination text goes in the assembled statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    /// Right after `SELECT [DISTINCT]` (SQL Server `TOP n`).
    Top(String),
    /// After ORDER BY (`LIMIT`, `OFFSET ... FETCH`).
    Tail(String),
    /// ANDed into the WHERE clause (Oracle `ROWNUM <= n`).
    Predicate(String),
}

// =============================================================================
// Upsert input
// =============================================================================

/// Pre-escaped pieces of an upsert, handed to the dialect to shape.
///
/// `columns` and `values` line up; `keys` is the conflict target and
/// `updates` the non-key columns to overwrite on conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertParts {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<String>,
    pub keys: Vec<String>,
    pub updates: Vec<String>,
}

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Case handling and regex matching have no default: every backend must
/// state its own idiom for them.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    /// Lexical facts for this engine.
    fn profile(&self) -> &'static DialectProfile;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    ///
    /// - MySQL/MariaDB/ClickHouse: `` `identifier` ``
    /// - Postgres/OpenGauss/SQLite/Oracle: `"identifier"`
    /// - SQL Server: `[identifier]`
    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_with(self.profile(), ident)
    }

    /// Quote a string literal, escaping with the profile's escape character.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string(self.profile(), s)
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    /// Format a `YYYY-MM-DD HH:MM:SS` timestamp literal.
    fn format_timestamp(&self, text: &str) -> String {
        self.quote_string(text)
    }

    /// Keyword placed between a table (or derived table) and its alias.
    fn table_alias_keyword(&self) -> &'static str {
        " AS "
    }

    // =========================================================================
    // Case Sensitivity
    // =========================================================================

    /// Rewrite an escaped column so comparisons against it are case-sensitive
    /// (`bin_` operators).
    fn force_case_sensitive(&self, column: &str) -> String;

    /// Render a LIKE that ignores case (`i`-prefixed operators).
    fn like_ignore_case(&self, column: &str, pattern: &str) -> String;

    /// Render a regular-expression match.
    fn regex_match(&self, column: &str, pattern: &str, ignore_case: bool)
        -> CompileResult<String>;

    // =========================================================================
    // Joins
    // =========================================================================

    /// Whether this dialect supports FULL OUTER JOIN.
    fn supports_full_outer_join(&self) -> bool {
        true
    }

    // =========================================================================
    // Pagination / Locking
    // =========================================================================

    /// Pagination text and placement for `limit`.
    ///
    /// Default: `LIMIT n` / `LIMIT n OFFSET m`.
    fn emit_pagination(&self, limit: Limit, has_order_by: bool) -> Option<Pagination> {
        let _ = has_order_by;
        helpers::limit_offset_standard(limit)
    }

    /// Whether this dialect requires ORDER BY for OFFSET/FETCH.
    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    /// Row-locking suffix, `None` where the engine has no such clause.
    fn for_update(&self) -> Option<&'static str> {
        Some("FOR UPDATE")
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Remap a function name for this dialect.
    ///
    /// Returns `Some(new_name)` if the function should be remapped, `None` to
    /// keep the original. The input is matched case-insensitively.
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }

    // =========================================================================
    // Write statements
    // =========================================================================

    /// Whether `REPLACE INTO` exists on this engine.
    fn supports_replace(&self) -> bool {
        false
    }

    /// Shape an upsert keyed on `parts.keys`.
    fn emit_upsert(&self, parts: &UpsertParts) -> CompileResult<String>;
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    MariaDb,
    SqlServer,
    Postgres,
    OpenGauss,
    Sqlite,
    Oracle,
    ClickHouse,
}

impl Dialect {
    /// Every supported dialect, in a stable order.
    pub const ALL: [Dialect; 8] = [
        Dialect::MySql,
        Dialect::MariaDb,
        Dialect::SqlServer,
        Dialect::Postgres,
        Dialect::OpenGauss,
        Dialect::Sqlite,
        Dialect::Oracle,
        Dialect::ClickHouse,
    ];

    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::MySql => &MySql,
            Dialect::MariaDb => &MariaDb,
            Dialect::SqlServer => &SqlServer,
            Dialect::Postgres => &Postgres,
            Dialect::OpenGauss => &OpenGauss,
            Dialect::Sqlite => &Sqlite,
            Dialect::Oracle => &Oracle,
            Dialect::ClickHouse => &ClickHouse,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn profile(&self) -> &'static DialectProfile {
        self.dialect().profile()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn format_timestamp(&self, text: &str) -> String {
        self.dialect().format_timestamp(text)
    }

    fn table_alias_keyword(&self) -> &'static str {
        self.dialect().table_alias_keyword()
    }

    fn force_case_sensitive(&self, column: &str) -> String {
        self.dialect().force_case_sensitive(column)
    }

    fn like_ignore_case(&self, column: &str, pattern: &str) -> String {
        self.dialect().like_ignore_case(column, pattern)
    }

    fn regex_match(
        &self,
        column: &str,
        pattern: &str,
        ignore_case: bool,
    ) -> CompileResult<String> {
        self.dialect().regex_match(column, pattern, ignore_case)
    }

    fn supports_full_outer_join(&self) -> bool {
        self.dialect().supports_full_outer_join()
    }

    fn emit_pagination(&self, limit: Limit, has_order_by: bool) -> Option<Pagination> {
        self.dialect().emit_pagination(limit, has_order_by)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        self.dialect().requires_order_by_for_offset()
    }

    fn for_update(&self) -> Option<&'static str> {
        self.dialect().for_update()
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.dialect().remap_function(name)
    }

    fn supports_replace(&self) -> bool {
        self.dialect().supports_replace()
    }

    fn emit_upsert(&self, parts: &UpsertParts) -> CompileResult<String> {
        self.dialect().emit_upsert(parts)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl std::str::FromStr for Dialect {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySql),
            "mariadb" => Ok(Dialect::MariaDb),
            "sqlserver" | "mssql" | "tsql" => Ok(Dialect::SqlServer),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "opengauss" | "gauss" => Ok(Dialect::OpenGauss),
            "sqlite" | "sqlite2" | "sqlite3" => Ok(Dialect::Sqlite),
            "oracle" => Ok(Dialect::Oracle),
            "clickhouse" => Ok(Dialect::ClickHouse),
            other => Err(CompileError::UnknownDialect(other.to_string())),
        }
    }
}
