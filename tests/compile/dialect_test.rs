//! Integration tests for per-dialect rendering: quoting, case handling,
//! regex support, FULL JOIN support and dialect parsing.

use chrono::NaiveDate;
use quarry::prelude::*;
use quarry::sql::SqlDialect;
use quarry::ErrorKind;
use quarry::sql::value;
use sqlparser::ast::{self, Expr, SelectItem, SetExpr, Statement};
use sqlparser::dialect::{
    ClickHouseDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::Parser;

fn registry() -> SchemaRegistry {
    let mut reg = SchemaRegistry::new();
    reg.register_table(TableSchema::new("table1", ["id", "name", "dt", "t2id"]))
        .unwrap();
    reg.register_table(TableSchema::new("table2", ["id", "title"]).with_model("Table2"))
        .unwrap();
    reg.register_join(
        JoinDeclaration::new("table1", "tb2", JoinKind::Left, "Table2").on("t2id", "id"),
    )
    .unwrap();
    reg.register_join(
        JoinDeclaration::new("table1", "everything", JoinKind::Full, "Table2").on("t2id", "id"),
    )
    .unwrap();
    reg.register_join(JoinDeclaration::new("table1", "nat", JoinKind::Natural, "Table2"))
        .unwrap();
    reg.build().unwrap();
    reg
}

fn where_sql(dialect: Dialect, key: &str, value: impl Into<Value>) -> CompileResult<String> {
    let reg = registry();
    Compiler::with_dialect(&reg, dialect)
        .to_where_sql(&Select::from("table1").filter(Conditions::new().with(key, value)))
}

#[test]
fn test_quoting_per_dialect() {
    let reg = registry();
    let select = Select::from("table1").fields(["id"]);
    let cases = [
        (Dialect::MySql, "SELECT `table1`.`id` FROM `table1`"),
        (Dialect::MariaDb, "SELECT `table1`.`id` FROM `table1`"),
        (Dialect::ClickHouse, "SELECT `table1`.`id` FROM `table1`"),
        (Dialect::SqlServer, "SELECT [table1].[id] FROM [table1]"),
        (Dialect::Postgres, r#"SELECT "table1"."id" FROM "table1""#),
        (Dialect::OpenGauss, r#"SELECT "table1"."id" FROM "table1""#),
        (Dialect::Sqlite, r#"SELECT "table1"."id" FROM "table1""#),
        (Dialect::Oracle, r#"SELECT "table1"."id" FROM "table1""#),
    ];
    for (dialect, expected) in cases {
        let sql = Compiler::with_dialect(&reg, dialect).to_sql(&select).unwrap();
        assert_eq!(sql, expected, "{}", dialect);
    }
}

#[test]
fn test_ignore_case_like_per_dialect() {
    let cases = [
        (Dialect::MySql, "`table1`.`name` like '%Ab%'"),
        (Dialect::SqlServer, "[table1].[name] like '%Ab%'"),
        (Dialect::Postgres, r#""table1"."name" ilike '%Ab%'"#),
        (Dialect::Sqlite, r#""table1"."name" like '%Ab%' COLLATE NOCASE"#),
        (Dialect::Oracle, r#"LOWER("table1"."name") like LOWER('%Ab%')"#),
        (Dialect::ClickHouse, "`table1`.`name` ilike '%Ab%'"),
    ];
    for (dialect, expected) in cases {
        assert_eq!(
            where_sql(dialect, "name__icontains", "Ab").unwrap(),
            expected,
            "{}",
            dialect
        );
    }
}

#[test]
fn test_binary_comparison_per_dialect() {
    assert_eq!(
        where_sql(Dialect::MariaDb, "name__bin_in", vec!["a", "B"]).unwrap(),
        "BINARY `table1`.`name` in ('a','B')"
    );
    assert_eq!(
        where_sql(Dialect::SqlServer, "name__bin_eq", "a").unwrap(),
        "[table1].[name] COLLATE Latin1_General_CS_AS='a'"
    );
    assert_eq!(
        where_sql(Dialect::Sqlite, "name__bin_eq", "a").unwrap(),
        r#""table1"."name"='a'"#
    );
    for dialect in [Dialect::Postgres, Dialect::OpenGauss] {
        assert_eq!(
            where_sql(dialect, "name__bin_eq", "a").unwrap(),
            r#""table1"."name"='a'"#
        );
        assert_eq!(
            where_sql(dialect, "name__istartswith", "a").unwrap(),
            r#""table1"."name" ilike 'a%'"#
        );
    }
}

#[test]
fn test_regex_per_dialect() {
    let cases = [
        (Dialect::MySql, "LOWER(`table1`.`name`) regexp LOWER('^a')"),
        (Dialect::Postgres, r#""table1"."name" ~* '^a'"#),
        (Dialect::OpenGauss, r#""table1"."name" ~* '^a'"#),
        (Dialect::Oracle, r#"REGEXP_LIKE("table1"."name", '^a', 'i')"#),
        (Dialect::ClickHouse, "match(`table1`.`name`, concat('(?i)', '^a'))"),
    ];
    for (dialect, expected) in cases {
        assert_eq!(where_sql(dialect, "name__iregex", "^a").unwrap(), expected);
    }
    assert_eq!(
        where_sql(Dialect::Postgres, "name__regex", "^a").unwrap(),
        r#""table1"."name" ~ '^a'"#
    );

    for dialect in [Dialect::Sqlite, Dialect::SqlServer] {
        let err = where_sql(dialect, "name__regex", "^a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dialect, "{}", dialect);
    }
}

#[test]
fn test_full_join_support() {
    let reg = registry();
    let select = Select::from("table1").fields(["id", "everything.title"]);

    for dialect in [Dialect::MySql, Dialect::MariaDb, Dialect::Sqlite] {
        let err = Compiler::with_dialect(&reg, dialect).compile(&select).unwrap_err();
        assert_eq!(
            err,
            CompileError::Unsupported {
                dialect: dialect.name().to_string(),
                what: "FULL JOIN".to_string(),
            }
        );
    }

    let plan = Compiler::with_dialect(&reg, Dialect::Postgres).compile(&select).unwrap();
    assert_eq!(
        plan.joins(),
        [r#"FULL JOIN "table2" AS "orm_everything" ON "table1"."t2id"="orm_everything"."id""#]
    );

    // Declared but unused FULL joins do not matter.
    Compiler::with_dialect(&reg, Dialect::MySql)
        .compile(&Select::from("table1").fields(["id"]))
        .unwrap();
}

#[test]
fn test_natural_join_has_no_on() {
    let reg = registry();
    let plan = Compiler::with_dialect(&reg, Dialect::MySql)
        .compile(&Select::from("table1").fields(["nat.title"]))
        .unwrap();
    assert_eq!(plan.joins(), ["NATURAL JOIN `table2` AS `orm_nat`"]);
}

#[test]
fn test_oracle_timestamps() {
    let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap();
    assert_eq!(
        where_sql(Dialect::Oracle, "dt", ts).unwrap(),
        r#""table1"."dt"=TO_DATE('2024-01-02 03:04:05', 'yyyy-mm-dd hh24:mi:ss')"#
    );
}

#[test]
fn test_dialect_parsing() {
    assert_eq!("mssql".parse::<Dialect>().unwrap(), Dialect::SqlServer);
    assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
    assert_eq!("sqlite3".parse::<Dialect>().unwrap(), Dialect::Sqlite);
    assert_eq!("gauss".parse::<Dialect>().unwrap(), Dialect::OpenGauss);
    let err = "db2".parse::<Dialect>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dialect);

    for dialect in Dialect::ALL {
        assert_eq!(dialect.to_string().parse::<Dialect>().unwrap(), dialect);
        assert_eq!(dialect.name(), dialect.to_string());
    }
}

#[test]
fn test_output_parses() {
    let reg = registry();
    let select = Select::from("table1")
        .fields(["id", "tb2.title"])
        .filter(Conditions::new().with("name__in", vec!["a", "b"]).with("id__gt", 3))
        .order_by(["-id"]);

    let mysql = Compiler::with_dialect(&reg, Dialect::MySql)
        .to_sql(&select.clone().page(10, 5))
        .unwrap();
    Parser::parse_sql(&MySqlDialect {}, &mysql).unwrap();

    let postgres = Compiler::with_dialect(&reg, Dialect::Postgres)
        .to_sql(&select.clone().limit(5))
        .unwrap();
    Parser::parse_sql(&PostgreSqlDialect {}, &postgres).unwrap();

    let sqlite = Compiler::with_dialect(&reg, Dialect::Sqlite)
        .to_count_sql(&select)
        .unwrap();
    Parser::parse_sql(&SQLiteDialect {}, &sqlite).unwrap();

    let mssql = Compiler::with_dialect(&reg, Dialect::SqlServer)
        .to_sql(&select.page(10, 5))
        .unwrap();
    Parser::parse_sql(&MsSqlDialect {}, &mssql).unwrap();
}

/// Pull the string back out of `SELECT '<literal>'`.
fn parse_string_literal(sql: &str, parser: &dyn sqlparser::dialect::Dialect) -> String {
    let statements = Parser::parse_sql(parser, sql).unwrap();
    assert_eq!(statements.len(), 1, "{}", sql);
    let Statement::Query(query) = &statements[0] else {
        panic!("not a query: {}", sql);
    };
    let SetExpr::Select(select) = query.body.as_ref() else {
        panic!("not a select: {}", sql);
    };
    match &select.projection[..] {
        [SelectItem::UnnamedExpr(Expr::Value(ast::Value::SingleQuotedString(s)))] => s.clone(),
        other => panic!("unexpected projection {:?}", other),
    }
}

#[test]
fn test_string_literals_survive_parsing() {
    let inputs = ["it's", r"back\slash", "two '' quotes", r"escaped \' quote", r"trailing \"];
    let parsers: [(Dialect, &dyn sqlparser::dialect::Dialect); 7] = [
        (Dialect::MySql, &MySqlDialect {}),
        (Dialect::MariaDb, &MySqlDialect {}),
        (Dialect::ClickHouse, &ClickHouseDialect {}),
        (Dialect::SqlServer, &MsSqlDialect {}),
        (Dialect::Postgres, &PostgreSqlDialect {}),
        (Dialect::OpenGauss, &PostgreSqlDialect {}),
        (Dialect::Sqlite, &SQLiteDialect {}),
    ];
    for (dialect, parser) in parsers {
        for input in inputs {
            let literal = value::format(&dialect, &Value::from(input)).unwrap();
            let sql = format!("SELECT {}", literal.sql);
            assert_eq!(parse_string_literal(&sql, parser), input, "{} {}", dialect, sql);
        }
    }
}
