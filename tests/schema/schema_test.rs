//! Integration tests for schema registration, the two-phase build and
//! wildcard expansion.

use quarry::prelude::*;
use quarry::ErrorKind;

fn tables(reg: &mut SchemaRegistry) {
    reg.register_table(TableSchema::new("ta", ["id", "bid"]).with_model("A"))
        .unwrap();
    reg.register_table(TableSchema::new("tb", ["id", "aid"]).with_model("B"))
        .unwrap();
}

/// ta -b-> tb -a-> ta: a cycle.
fn cyclic() -> SchemaRegistry {
    let mut reg = SchemaRegistry::new();
    tables(&mut reg);
    reg.register_join(JoinDeclaration::new("ta", "b", JoinKind::Left, "B").on("bid", "id"))
        .unwrap();
    reg.register_join(JoinDeclaration::new("tb", "a", JoinKind::Inner, "A").on("aid", "id"))
        .unwrap();
    reg.build().unwrap();
    reg
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_duplicate_registrations() {
    let mut reg = SchemaRegistry::new();
    tables(&mut reg);

    let err = reg
        .register_table(TableSchema::new("ta", ["id"]).with_model("Other"))
        .unwrap_err();
    assert_eq!(err, CompileError::DuplicateTable("ta".into()));

    let err = reg
        .register_table(TableSchema::new("tc", ["id"]).with_model("A"))
        .unwrap_err();
    assert_eq!(err, CompileError::DuplicateModel("A".into()));

    reg.register_join(JoinDeclaration::new("ta", "b", JoinKind::Left, "B").on("bid", "id"))
        .unwrap();
    let err = reg
        .register_join(JoinDeclaration::new("ta", "b", JoinKind::Inner, "B").on("bid", "id"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn test_identifier_policy() {
    let mut reg = SchemaRegistry::new();
    for schema in [
        TableSchema::new("Users", ["id"]),
        TableSchema::new("users", ["id", "first name"]),
        TableSchema::new("a".repeat(65), ["id"]),
    ] {
        let err = reg.register_table(schema).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    reg.register_table(TableSchema::new("a".repeat(64), ["id", "x-y"]))
        .unwrap();
}

#[test]
fn test_keys_must_be_columns() {
    let mut reg = SchemaRegistry::new();
    let err = reg
        .register_table(TableSchema::new("t", ["id"]).with_primary_key("uid"))
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownColumn { .. }));
}

#[test]
fn test_join_declaration_checks() {
    let mut reg = SchemaRegistry::new();
    tables(&mut reg);

    let err = reg
        .register_join(JoinDeclaration::new("ta", "b", JoinKind::Left, "B"))
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::MissingJoinColumns {
            table: "ta".into(),
            tag: "b".into()
        }
    );

    let err = reg
        .register_join(JoinDeclaration::new("ta", "b__x", JoinKind::Left, "B").on("bid", "id"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_build_resolves_targets() {
    let mut reg = SchemaRegistry::new();
    tables(&mut reg);
    reg.register_join(JoinDeclaration::new("ta", "c", JoinKind::Left, "C").on("bid", "id"))
        .unwrap();
    assert_eq!(
        reg.build().unwrap_err(),
        CompileError::UnknownJoinTarget {
            table: "ta".into(),
            tag: "c".into(),
            target: "C".into()
        }
    );

    let mut reg = SchemaRegistry::new();
    tables(&mut reg);
    reg.register_join(JoinDeclaration::new("ta", "b", JoinKind::Left, "B").on("bid", "nope"))
        .unwrap();
    assert!(matches!(
        reg.build().unwrap_err(),
        CompileError::UnknownColumn { .. }
    ));

    let mut reg = SchemaRegistry::new();
    tables(&mut reg);
    reg.register_join(JoinDeclaration::new("tx", "b", JoinKind::Left, "B").on("bid", "id"))
        .unwrap();
    assert_eq!(
        reg.build().unwrap_err(),
        CompileError::UnknownTable("tx".into())
    );
}

#[test]
fn test_build_exactly_once() {
    let mut reg = cyclic();
    assert!(reg.is_built());
    assert_eq!(reg.build().unwrap_err(), CompileError::AlreadyBuilt);
    assert_eq!(
        reg.register_table(TableSchema::new("tc", ["id"])).unwrap_err(),
        CompileError::AlreadyBuilt
    );
}

#[test]
fn test_joins_without_tables() {
    let mut reg = SchemaRegistry::new();
    reg.register_join(JoinDeclaration::new("ta", "b", JoinKind::Left, "B").on("bid", "id"))
        .unwrap();
    let err = reg.build().unwrap_err();
    assert_eq!(err, CompileError::NoTables);
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn test_compile_before_build() {
    let mut reg = SchemaRegistry::new();
    tables(&mut reg);
    let err = Compiler::with_dialect(&reg, Dialect::MySql)
        .compile(&Select::from("ta"))
        .unwrap_err();
    assert_eq!(err, CompileError::NotBuilt);
}

// ============================================================================
// Lookups and wildcard expansion
// ============================================================================

#[test]
fn test_joins_of_in_declaration_order() {
    let mut reg = SchemaRegistry::new();
    tables(&mut reg);
    reg.register_join(JoinDeclaration::new("ta", "second", JoinKind::Left, "B").on("bid", "id"))
        .unwrap();
    reg.register_join(JoinDeclaration::new("ta", "first", JoinKind::Left, "B").on("bid", "id"))
        .unwrap();
    reg.build().unwrap();
    let tags: Vec<&str> = reg.joins_of("ta").map(|j| j.tag.as_str()).collect();
    assert_eq!(tags, ["second", "first"]);
    assert_eq!(reg.joins_of("tb").count(), 0);
}

#[test]
fn test_cyclic_wildcard_is_bounded_by_depth() {
    let reg = cyclic();
    assert_eq!(reg.expand_wildcard("ta", &[], 0).unwrap(), ["id", "bid"]);
    assert_eq!(
        reg.expand_wildcard("ta", &[], 2).unwrap(),
        ["id", "bid", "b.id", "b.aid", "b.a.id", "b.a.bid"]
    );
}

#[test]
fn test_cyclic_select_aliases_each_hop() {
    let reg = cyclic();
    let plan = Compiler::with_dialect(&reg, Dialect::Postgres)
        .compile(&Select::from("ta").fields(["b.a.id"]))
        .unwrap();
    assert_eq!(
        plan.joins(),
        [
            r#"LEFT JOIN "tb" AS "orm_b" ON "ta"."bid"="orm_b"."id""#,
            r#"INNER JOIN "ta" AS "orm_b__a" ON "orm_b"."aid"="orm_b__a"."id""#,
        ]
    );
    assert_eq!(plan.columns(), [r#""orm_b__a"."id" AS "b.a.id""#]);
}

#[test]
fn test_registry_shared_across_threads() {
    let reg = cyclic();
    let select = Select::from("ta").fields(["*1"]);
    let expected = Compiler::with_dialect(&reg, Dialect::MySql)
        .to_sql(&select)
        .unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    Compiler::with_dialect(&reg, Dialect::MySql)
                        .to_sql(&select)
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
