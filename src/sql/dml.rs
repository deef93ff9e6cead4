//! DML (Data Manipulation Language) support.
//!
//! INSERT, upsert, REPLACE, UPDATE and DELETE over registered tables. Values
//! go through the same formatter as conditions, and WHERE clauses through
//! the same condition compiler.
//!
//! # Examples
//!
//! ```ignore
//! let compiler = Compiler::with_dialect(&registry, Dialect::Postgres);
//!
//! let insert = Insert::into("users").row(Row::new().set("id", 1).set("name", "Alice"));
//! let upsert = Upsert::into("users").row(Row::new().set("id", 1).set("name", "Alice"));
//! let update = Update::table("users")
//!     .set("name", "Bob")
//!     .filter(Conditions::new().with("id", 1));
//! let delete = Delete::from("users").filter(Conditions::new().with("id__in", vec![1, 2]));
//!
//! let sql = upsert.to_sql(&compiler)?;
//! ```
//!
//! Zero timestamps (`0001-01-01 00:00:00`) mean "unset" and are left out of
//! column lists. Conditions on UPDATE/DELETE cannot follow joins.

use super::column::{ColumnResolver, JoinState};
use super::condition::{self, Conditions, Linker};
use super::dialect::{helpers, Dialect, SqlDialect, UpsertParts};
use super::query::Compiler;
use super::value::{self, Value};
use crate::error::{CompileError, CompileResult};
use crate::ident;
use crate::schema::TableSchema;

/// Column/value pairs of one row, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(Vec<(String, Value)>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((column.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }

    /// Columns that will be written: zero timestamps are left out.
    fn written(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Timestamp(ts) if value::is_zero_timestamp(ts)))
            .map(|(c, _)| c.as_str())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Row(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Rows rendered to escaped columns and literals, unset columns dropped.
struct RenderedRows {
    /// Bare column names that survived.
    names: Vec<String>,
    columns: Vec<String>,
    values: Vec<Vec<String>>,
}

fn check_column(table: &TableSchema, column: &str) -> CompileResult<()> {
    if column.starts_with('#') {
        return Err(CompileError::RawNotAllowed(column.to_string()));
    }
    ident::validate(column)?;
    if !table.has_column(column) {
        return Err(CompileError::UnknownColumn {
            table: table.name.clone(),
            column: column.to_string(),
        });
    }
    Ok(())
}

/// Validate and render `rows`.
///
/// A column is dropped only when it is unset in every row; where some rows
/// set it, the unset ones write NULL.
fn render_rows(dialect: Dialect, table: &TableSchema, rows: &[Row]) -> CompileResult<RenderedRows> {
    let Some(first) = rows.first() else {
        return Err(CompileError::EmptyRow);
    };
    if first.is_empty() {
        return Err(CompileError::EmptyRow);
    }
    let names: Vec<&str> = first.columns().collect();
    for column in &names {
        check_column(table, column)?;
    }

    let mut literals = Vec::with_capacity(rows.len());
    for row in rows {
        if !row.columns().eq(names.iter().copied()) {
            return Err(CompileError::invalid_field(
                &table.name,
                "every row must list the same columns in the same order",
            ));
        }
        literals.push(
            row.0
                .iter()
                .map(|(_, v)| value::format(&dialect, v))
                .collect::<CompileResult<Vec<_>>>()?,
        );
    }

    let keep: Vec<usize> = (0..names.len())
        .filter(|&i| literals.iter().any(|row| !row[i].is_empty))
        .collect();
    if keep.is_empty() {
        return Err(CompileError::EmptyRow);
    }

    Ok(RenderedRows {
        names: keep.iter().map(|&i| names[i].to_string()).collect(),
        columns: keep
            .iter()
            .map(|&i| dialect.quote_identifier(names[i]))
            .collect(),
        values: literals
            .iter()
            .map(|row| {
                keep.iter()
                    .map(|&i| {
                        if row[i].is_empty {
                            "NULL".to_string()
                        } else {
                            row[i].sql.clone()
                        }
                    })
                    .collect()
            })
            .collect(),
    })
}

fn values_list(values: &[Vec<String>]) -> String {
    values
        .iter()
        .map(|row| format!("({})", row.join(",")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Compile `conditions` against `table` for a statement that cannot join.
fn compile_where(
    compiler: &Compiler<'_>,
    table: &TableSchema,
    conditions: &Conditions,
) -> CompileResult<String> {
    let resolver = ColumnResolver::new(compiler.registry, &compiler.options, &table.name, None);
    let mut joins = JoinState::new();
    let sql = condition::compile(&resolver, &mut joins, conditions, Linker::And)?;
    if let Some(join) = joins.joins().first() {
        return Err(CompileError::JoinNotAllowed(join.path.join(".")));
    }
    Ok(sql)
}

// ============================================================================
// INSERT
// ============================================================================

/// INSERT of one or more rows.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Insert {
    pub table: String,
    pub rows: Vec<Row>,
}

impl Insert {
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn to_sql(&self, compiler: &Compiler<'_>) -> CompileResult<String> {
        let dialect = compiler.dialect();
        let table = compiler.registry.table(&self.table)?;
        let rendered = render_rows(dialect, table, &self.rows)?;
        let quoted_table = dialect.quote_identifier(&table.name);

        if dialect == Dialect::Oracle && rendered.values.len() > 1 {
            let targets = rendered
                .values
                .iter()
                .map(|row| {
                    format!(
                        "INTO {} ({}) VALUES ({})",
                        quoted_table,
                        rendered.columns.join(","),
                        row.join(",")
                    )
                })
                .collect::<Vec<_>>()
                .join(" ");
            return Ok(format!("INSERT ALL {} SELECT 1 FROM DUAL", targets));
        }

        Ok(format!(
            "INSERT INTO {} ({}) VALUES {}",
            quoted_table,
            rendered.columns.join(","),
            values_list(&rendered.values)
        ))
    }
}

// ============================================================================
// UPSERT
// ============================================================================

/// Insert-or-update of a single row.
///
/// The conflict target is the primary key when the row sets it, otherwise
/// the full unique-key set when the row sets all of it; with neither this
/// is a plain INSERT.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Upsert {
    pub table: String,
    pub row: Row,
}

impl Upsert {
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row: Row::new(),
        }
    }

    pub fn row(mut self, row: Row) -> Self {
        self.row = row;
        self
    }

    /// Key columns the upsert will conflict on; empty means plain insert.
    ///
    /// A key only counts when its value is written, so a zero timestamp in a
    /// key column moves on to the next strategy.
    pub fn conflict_keys(&self, table: &TableSchema) -> Vec<String> {
        let present = |c: &str| self.row.written().any(|r| r == c);
        if let Some(pk) = table.primary_key.as_deref().filter(|&pk| present(pk)) {
            return vec![pk.to_string()];
        }
        if !table.unique_keys.is_empty() && table.unique_keys.iter().all(|k| present(k.as_str())) {
            return table.unique_keys.clone();
        }
        Vec::new()
    }

    pub fn to_sql(&self, compiler: &Compiler<'_>) -> CompileResult<String> {
        let dialect = compiler.dialect();
        let table = compiler.registry.table(&self.table)?;
        let rendered = render_rows(dialect, table, std::slice::from_ref(&self.row))?;

        let keys = self.conflict_keys(table);

        let parts = UpsertParts {
            table: dialect.quote_identifier(&table.name),
            columns: rendered.columns.clone(),
            values: rendered.values.into_iter().next().unwrap_or_default(),
            keys: keys.iter().map(|k| dialect.quote_identifier(k)).collect(),
            updates: rendered
                .names
                .iter()
                .filter(|n| !keys.contains(n))
                .map(|n| dialect.quote_identifier(n))
                .collect(),
        };
        if parts.keys.is_empty() {
            return Ok(helpers::insert_values("INSERT", &parts));
        }
        dialect.emit_upsert(&parts)
    }
}

// ============================================================================
// REPLACE
// ============================================================================

/// `REPLACE INTO`, where the engine has it.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Replace {
    pub table: String,
    pub rows: Vec<Row>,
}

impl Replace {
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    pub fn to_sql(&self, compiler: &Compiler<'_>) -> CompileResult<String> {
        let dialect = compiler.dialect();
        if !dialect.supports_replace() {
            return Err(CompileError::unsupported(dialect.name(), "REPLACE"));
        }
        let table = compiler.registry.table(&self.table)?;
        let rendered = render_rows(dialect, table, &self.rows)?;
        Ok(format!(
            "REPLACE INTO {} ({}) VALUES {}",
            dialect.quote_identifier(&table.name),
            rendered.columns.join(","),
            values_list(&rendered.values)
        ))
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Update {
    pub table: String,
    pub assignments: Row,
    pub conditions: Conditions,
}

impl Update {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            assignments: Row::new(),
            conditions: Conditions::new(),
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments = self.assignments.set(column, value);
        self
    }

    pub fn filter(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn to_sql(&self, compiler: &Compiler<'_>) -> CompileResult<String> {
        let dialect = compiler.dialect();
        let table = compiler.registry.table(&self.table)?;
        let rendered = render_rows(dialect, table, std::slice::from_ref(&self.assignments))?;
        let set = rendered
            .columns
            .iter()
            .zip(rendered.values.iter().flatten())
            .map(|(c, v)| format!("{}={}", c, v))
            .collect::<Vec<_>>()
            .join(",");

        let mut sql = format!("UPDATE {} SET {}", dialect.quote_identifier(&table.name), set);
        let where_clause = compile_where(compiler, table, &self.conditions)?;
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }
        Ok(sql)
    }
}

// ============================================================================
// DELETE
// ============================================================================

/// DELETE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Delete {
    pub table: String,
    pub conditions: Conditions,
}

impl Delete {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            conditions: Conditions::new(),
        }
    }

    pub fn filter(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn to_sql(&self, compiler: &Compiler<'_>) -> CompileResult<String> {
        let dialect = compiler.dialect();
        let table = compiler.registry.table(&self.table)?;
        let mut sql = format!("DELETE FROM {}", dialect.quote_identifier(&table.name));
        let where_clause = compile_where(compiler, table, &self.conditions)?;
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }
        Ok(sql)
    }
}
