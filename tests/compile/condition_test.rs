//! Integration tests for the condition DSL: operators, nesting, negation
//! and the JSON form.

use chrono::NaiveDate;
use quarry::prelude::*;
use quarry::ErrorKind;
use serde_json::json;

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
    reg.build().unwrap();
    reg
}

fn where_sql(dialect: Dialect, conditions: Conditions) -> CompileResult<String> {
    let reg = registry();
    Compiler::with_dialect(&reg, dialect).to_where_sql(&Select::from("table1").filter(conditions))
}

fn mysql(conditions: Conditions) -> CompileResult<String> {
    where_sql(Dialect::MySql, conditions)
}

// ============================================================================
// Basic scenarios
// ============================================================================

#[test]
fn test_equality() {
    assert_eq!(
        mysql(Conditions::new().with("name", "test")).unwrap(),
        "`table1`.`name`='test'"
    );
}

#[test]
fn test_siblings_keep_input_order() {
    assert_eq!(
        mysql(Conditions::new().with("id__gt", 1).with("id__lt", 10)).unwrap(),
        "`table1`.`id`>1 and `table1`.`id`<10"
    );
    assert_eq!(
        mysql(Conditions::new().with("id__lt", 10).with("id__gt", 1)).unwrap(),
        "`table1`.`id`<10 and `table1`.`id`>1"
    );
}

#[test]
fn test_negated_membership() {
    assert_eq!(
        mysql(Conditions::new().with("~id__in", vec![1, 2, 3])).unwrap(),
        "(not (`table1`.`id` in (1,2,3)))"
    );
}

#[test]
fn test_between_arity() {
    for bad in [vec![1], vec![1, 2, 3], vec![]] {
        let err = mysql(Conditions::new().with("dt__between", bad)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }
    assert_eq!(
        mysql(Conditions::new().with("id__between", vec![1, 9])).unwrap(),
        "`table1`.`id` between 1 and 9"
    );
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_like_family() {
    let cases = [
        ("name__startswith", "`table1`.`name` like 'ab%'"),
        ("name__endswith", "`table1`.`name` like '%ab'"),
        ("name__contains", "`table1`.`name` like '%ab%'"),
        ("name__customlike", "`table1`.`name` like 'ab'"),
    ];
    for (key, expected) in cases {
        assert_eq!(mysql(Conditions::new().with(key, "ab")).unwrap(), expected);
    }
}

#[test]
fn test_like_arrays() {
    assert_eq!(
        mysql(Conditions::new().with("name__contains", vec!["a", "b"])).unwrap(),
        "(`table1`.`name` like '%a%' and `table1`.`name` like '%b%')"
    );
    assert_eq!(
        mysql(Conditions::new().with("name__or_contains", vec!["a", "b"])).unwrap(),
        "(`table1`.`name` like '%a%' or `table1`.`name` like '%b%')"
    );
    assert_eq!(
        mysql(Conditions::new().with("name__or_contains", vec!["a"])).unwrap(),
        "`table1`.`name` like '%a%'"
    );
}

#[test]
fn test_null_operators() {
    assert_eq!(
        mysql(Conditions::new().with("name__null", true)).unwrap(),
        "`table1`.`name` is null"
    );
    assert_eq!(
        mysql(Conditions::new().with("name__null", false)).unwrap(),
        "`table1`.`name` is not null"
    );
    assert_eq!(
        mysql(Conditions::new().with("name", Value::Null)).unwrap(),
        "`table1`.`name` is null"
    );
    assert_eq!(
        mysql(Conditions::new().with("name__ne", None::<String>)).unwrap(),
        "`table1`.`name` is not null"
    );
}

#[test]
fn test_date_operator() {
    assert_eq!(
        mysql(Conditions::new().with("~dt__date", "2024-03-05")).unwrap(),
        "(not (`table1`.`dt`>='2024-03-05 00:00:00' and `table1`.`dt`<'2024-03-06 00:00:00'))"
    );
}

#[test]
fn test_timestamp_operand() {
    let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap();
    assert_eq!(
        mysql(Conditions::new().with("dt__gte", ts)).unwrap(),
        "`table1`.`dt`>='2024-01-02 03:04:05'"
    );
}

#[test]
fn test_literals() {
    assert_eq!(
        mysql(Conditions::new().with("name", "it's")).unwrap(),
        r"`table1`.`name`='it\'s'"
    );
    assert_eq!(
        where_sql(Dialect::Postgres, Conditions::new().with("name", "it's")).unwrap(),
        r#""table1"."name"='it''s'"#
    );
    assert_eq!(
        mysql(Conditions::new().with("id__gt", 1.5)).unwrap(),
        "`table1`.`id`>1.5"
    );
    assert_eq!(
        mysql(Conditions::new().with("id", true)).unwrap(),
        "`table1`.`id`=1"
    );
    assert_eq!(
        where_sql(Dialect::Postgres, Conditions::new().with("id", true)).unwrap(),
        r#""table1"."id"=1"#
    );
}

#[test]
fn test_non_finite_float() {
    let err = mysql(Conditions::new().with("id__gt", f64::NAN)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_operator_errors() {
    let err = mysql(Conditions::new().with("name__nope", 1)).unwrap_err();
    assert_eq!(err, CompileError::UnknownOperator("nope".into()));
    assert_eq!(err.kind(), ErrorKind::Syntax);

    let err = mysql(Conditions::new().with("id__in", Vec::<i64>::new())).unwrap_err();
    assert_eq!(err, CompileError::EmptyArray("in".into()));

    let err = mysql(Conditions::new().with("id__gt", vec![1, 2])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_fields_in_conditions() {
    assert_eq!(
        mysql(Conditions::new().with("#LOWER(name)", "x")).unwrap(),
        "LOWER(name)='x'"
    );
    assert_eq!(
        mysql(Conditions::new().with("name as n", "x")).unwrap_err().kind(),
        ErrorKind::Syntax
    );
    assert_eq!(
        mysql(Conditions::new().with("tb2.*", 1)).unwrap_err().kind(),
        ErrorKind::Syntax
    );
    assert!(matches!(
        mysql(Conditions::new().with("missing", 1)).unwrap_err(),
        CompileError::UnknownColumn { .. }
    ));
}

// ============================================================================
// Nesting
// ============================================================================

#[test]
fn test_or_group() {
    let cond = Conditions::new()
        .with("name", "a")
        .group("$or", Conditions::new().with("id", 1).with("id", 2));
    assert_eq!(
        mysql(cond).unwrap(),
        "`table1`.`name`='a' and (`table1`.`id`=1 or `table1`.`id`=2)"
    );
}

#[test]
fn test_or_of_and_groups() {
    let cond = Conditions::new().groups(
        "$or",
        vec![
            Conditions::new().with("id", 1).with("name", "a"),
            Conditions::new().with("id", 2),
        ],
    );
    assert_eq!(
        mysql(cond).unwrap(),
        "(`table1`.`id`=1 and `table1`.`name`='a' or `table1`.`id`=2)"
    );
}

#[test]
fn test_negated_group() {
    let cond = Conditions::new().group("~$or", Conditions::new().with("id", 1).with("id", 2));
    assert_eq!(
        mysql(cond).unwrap(),
        "(not (`table1`.`id`=1 or `table1`.`id`=2))"
    );
}

#[test]
fn test_empty_groups_are_skipped() {
    let cond = Conditions::new()
        .group("$or", Conditions::new())
        .with("id", 1)
        .groups("$and", vec![]);
    assert_eq!(mysql(cond).unwrap(), "`table1`.`id`=1");
}

#[test]
fn test_combinator_needs_tree() {
    let err = mysql(Conditions::new().with("$or", 1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

// ============================================================================
// JSON form
// ============================================================================

#[test]
fn test_json_conditions_keep_document_order() {
    let cond: Conditions = serde_json::from_value(json!({
        "name__contains": "a",
        "$or": [
            {"id": 1},
            {"id__gt": 5, "name__null": true}
        ],
        "~tb2.title__in": ["x", "y"]
    }))
    .unwrap();
    assert_eq!(
        mysql(cond).unwrap(),
        "`table1`.`name` like '%a%' and (`table1`.`id`=1 or `table1`.`id`>5 and `table1`.`name` is null) and (not (`orm_tb2`.`title` in ('x','y')))"
    );
}

#[test]
fn test_json_rejects_bad_shapes() {
    assert!(Conditions::try_from(json!([1, 2])).is_err());
    assert!(Conditions::try_from(json!({"$or": "x"})).is_err());
    assert!(Conditions::try_from(json!({"name": {"nested": 1}})).is_err());
}
