//! Test utilities for SQL emission validation.
//!
//! Parses emitted SQL with sqlparser-rs so tests catch malformed output,
//! not just unexpected strings.

use sqlparser::dialect::{
    ClickHouseDialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
    SQLiteDialect,
};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Validates that a SQL string is syntactically valid for the given dialect.
///
/// # Example
///
/// ```ignore
/// use crate::sql::test_utils::validate_sql;
/// use crate::sql::dialect::Dialect;
///
/// validate_sql("SELECT * FROM `users`", Dialect::MySql).unwrap();
/// ```
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::MySql | Dialect::MariaDb => Box::new(MySqlDialect {}),
        Dialect::SqlServer => Box::new(MsSqlDialect {}),
        // openGauss keeps Postgres quoting
        Dialect::Postgres | Dialect::OpenGauss => Box::new(PostgreSqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::ClickHouse => Box::new(ClickHouseDialect {}),
        Dialect::Oracle => Box::new(GenericDialect {}), // sqlparser has no Oracle dialect
    };

    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {}: {}\nSQL: {}", dialect, e, sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("SELECT * FROM `users`", Dialect::MySql).unwrap();
        validate_sql(r#"SELECT * FROM "users""#, Dialect::Postgres).unwrap();
        validate_sql("SELECT * FROM [users]", Dialect::SqlServer).unwrap();
    }

    #[test]
    fn test_validate_invalid_sql() {
        let result = validate_sql("SELEC * FORM users", Dialect::Sqlite);
        assert!(result.is_err());
    }
}
