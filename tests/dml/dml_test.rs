//! Integration tests for INSERT, upsert, REPLACE, UPDATE and DELETE.

use chrono::{NaiveDate, NaiveDateTime};
use insta::assert_snapshot;
use quarry::prelude::*;
use quarry::ErrorKind;

fn registry() -> SchemaRegistry {
    let mut reg = SchemaRegistry::new();
    reg.register_table(
        TableSchema::new("users", ["id", "email", "name", "created", "team_id"])
            .with_primary_key("id")
            .with_unique_keys(["email"]),
    )
    .unwrap();
    reg.register_table(TableSchema::new("teams", ["id", "title"]).with_model("Team"))
        .unwrap();
    reg.register_join(
        JoinDeclaration::new("users", "team", JoinKind::Left, "Team").on("team_id", "id"),
    )
    .unwrap();
    reg.build().unwrap();
    reg
}

fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap()
}

fn zero() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn user() -> Row {
    Row::new().set("id", 1).set("name", "n")
}

// ============================================================================
// INSERT
// ============================================================================

#[test]
fn test_insert_mixed_zero_timestamps() {
    let reg = registry();
    let compiler = Compiler::with_dialect(&reg, Dialect::MySql);
    let sql = Insert::into("users")
        .row(Row::new().set("id", 1).set("created", zero()))
        .row(Row::new().set("id", 2).set("created", ts(2024, 1, 2)))
        .to_sql(&compiler)
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO `users` (`id`,`created`) VALUES (1,NULL),(2,'2024-01-02 03:04:05')"
    );
}

#[test]
fn test_insert_only_zero_timestamps() {
    let reg = registry();
    let compiler = Compiler::with_dialect(&reg, Dialect::MySql);
    let err = Insert::into("users")
        .row(Row::new().set("created", zero()))
        .to_sql(&compiler)
        .unwrap_err();
    assert_eq!(err, CompileError::EmptyRow);
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_insert_unknown_table() {
    let reg = registry();
    let compiler = Compiler::with_dialect(&reg, Dialect::MySql);
    let err = Insert::into("ghosts").row(user()).to_sql(&compiler).unwrap_err();
    assert_eq!(err, CompileError::UnknownTable("ghosts".into()));
}

// ============================================================================
// Upsert
// ============================================================================

#[test]
fn test_upsert_on_duplicate_key() {
    let reg = registry();
    let compiler = Compiler::with_dialect(&reg, Dialect::MySql);
    assert_eq!(
        Upsert::into("users").row(user()).to_sql(&compiler).unwrap(),
        "INSERT INTO `users` (`id`,`name`) VALUES (1,'n') ON DUPLICATE KEY UPDATE `name`=VALUES(`name`)"
    );
    assert_eq!(
        Upsert::into("users")
            .row(Row::new().set("id", 1))
            .to_sql(&compiler)
            .unwrap(),
        "INSERT INTO `users` (`id`) VALUES (1) ON DUPLICATE KEY UPDATE `id`=`id`"
    );
}

#[test]
fn test_upsert_on_conflict() {
    let reg = registry();
    let sqlite = Compiler::with_dialect(&reg, Dialect::Sqlite);
    assert_eq!(
        Upsert::into("users")
            .row(Row::new().set("id", 1))
            .to_sql(&sqlite)
            .unwrap(),
        r#"INSERT INTO "users" ("id") VALUES (1) ON CONFLICT ("id") DO NOTHING"#
    );

    let postgres = Compiler::with_dialect(&reg, Dialect::Postgres);
    assert_eq!(
        Upsert::into("users")
            .row(Row::new().set("email", "e@x").set("name", "n"))
            .to_sql(&postgres)
            .unwrap(),
        r#"INSERT INTO "users" ("email","name") VALUES ('e@x','n') ON CONFLICT ("email") DO UPDATE SET "name"=EXCLUDED."name""#
    );
}

#[test]
fn test_upsert_opengauss() {
    let reg = registry();
    let compiler = Compiler::with_dialect(&reg, Dialect::OpenGauss);
    assert_eq!(
        Upsert::into("users").row(user()).to_sql(&compiler).unwrap(),
        r#"INSERT INTO "users" ("id","name") VALUES (1,'n') ON DUPLICATE KEY UPDATE "name"=EXCLUDED."name""#
    );
}

#[test]
fn test_upsert_without_keys_is_insert() {
    let reg = registry();
    let compiler = Compiler::with_dialect(&reg, Dialect::SqlServer);
    assert_eq!(
        Upsert::into("users")
            .row(Row::new().set("name", "n"))
            .to_sql(&compiler)
            .unwrap(),
        "INSERT INTO [users] ([name]) VALUES ('n')"
    );
}

mod snapshot_tests {
    use super::*;

    #[test]
    fn test_upsert_merge_sqlserver() {
        let reg = registry();
        let compiler = Compiler::with_dialect(&reg, Dialect::SqlServer);
        let sql = Upsert::into("users").row(user()).to_sql(&compiler).unwrap();
        assert_snapshot!(sql, @"MERGE INTO [users] AS tgt USING (SELECT 1 AS [id],'n' AS [name]) AS src ON (tgt.[id]=src.[id]) WHEN MATCHED THEN UPDATE SET tgt.[name]=src.[name] WHEN NOT MATCHED THEN INSERT ([id],[name]) VALUES (src.[id],src.[name]);");
    }

    #[test]
    fn test_upsert_merge_oracle() {
        let reg = registry();
        let compiler = Compiler::with_dialect(&reg, Dialect::Oracle);
        let sql = Upsert::into("users").row(user()).to_sql(&compiler).unwrap();
        assert_snapshot!(sql, @r#"MERGE INTO "users" tgt USING (SELECT 1 AS "id",'n' AS "name" FROM DUAL) src ON (tgt."id"=src."id") WHEN MATCHED THEN UPDATE SET tgt."name"=src."name" WHEN NOT MATCHED THEN INSERT ("id","name") VALUES (src."id",src."name")"#);
    }
}

// ============================================================================
// REPLACE
// ============================================================================

#[test]
fn test_replace_support() {
    let reg = registry();
    let replace = Replace::into("users").row(user());
    assert_eq!(
        replace
            .to_sql(&Compiler::with_dialect(&reg, Dialect::Sqlite))
            .unwrap(),
        r#"REPLACE INTO "users" ("id","name") VALUES (1,'n')"#
    );
    assert_eq!(
        replace
            .to_sql(&Compiler::with_dialect(&reg, Dialect::MariaDb))
            .unwrap(),
        "REPLACE INTO `users` (`id`,`name`) VALUES (1,'n')"
    );
    for dialect in [Dialect::SqlServer, Dialect::Oracle, Dialect::ClickHouse] {
        let err = replace
            .to_sql(&Compiler::with_dialect(&reg, dialect))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dialect, "{}", dialect);
    }
}

// ============================================================================
// UPDATE / DELETE
// ============================================================================

#[test]
fn test_update_with_group() {
    let reg = registry();
    let compiler = Compiler::with_dialect(&reg, Dialect::SqlServer);
    let sql = Update::table("users")
        .set("name", "x")
        .set("created", ts(2024, 5, 6))
        .filter(Conditions::new().group("$or", Conditions::new().with("id", 1).with("id", 2)))
        .to_sql(&compiler)
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE [users] SET [name]='x',[created]='2024-05-06 03:04:05' WHERE ([users].[id]=1 or [users].[id]=2)"
    );
}

#[test]
fn test_update_only_zero_timestamps() {
    let reg = registry();
    let compiler = Compiler::with_dialect(&reg, Dialect::MySql);
    let err = Update::table("users")
        .set("created", zero())
        .to_sql(&compiler)
        .unwrap_err();
    assert_eq!(err, CompileError::EmptyRow);
}

#[test]
fn test_delete_rejects_join() {
    let reg = registry();
    let compiler = Compiler::with_dialect(&reg, Dialect::MySql);
    let err = Delete::from("users")
        .filter(Conditions::new().with("team.title", "old"))
        .to_sql(&compiler)
        .unwrap_err();
    assert_eq!(err, CompileError::JoinNotAllowed("team".into()));
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_delete_with_subquery() {
    let reg = registry();
    let compiler = Compiler::with_dialect(&reg, Dialect::MySql);
    let teams = compiler
        .subquery(
            &Select::from("teams")
                .fields(["id"])
                .filter(Conditions::new().with("title", "old")),
        )
        .unwrap();
    let sql = Delete::from("users")
        .filter(Conditions::new().with("team_id__in", teams))
        .to_sql(&compiler)
        .unwrap();
    assert_eq!(
        sql,
        "DELETE FROM `users` WHERE `users`.`team_id` in (SELECT `teams`.`id` FROM `teams` WHERE `teams`.`title`='old')"
    );
}
