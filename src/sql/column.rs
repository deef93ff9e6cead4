//! Column references: parsing field strings and resolving them to SQL.
//!
//! A field string looks like one of
//!
//! ```text
//! name                 bare column of the base table
//! tb2.tb3.name         column reached through the join tags tb2 then tb3
//! count(id)            function over a column (count(*) too)
//! tb2.count(id)        the path may sit before the function...
//! count(tb2.id)        ...or inside its argument
//! *  *2  tb2.*  tb2.*1 wildcards, optionally with a join depth
//! name as n            explicit output alias
//! #anything            raw text, passed through untouched
//! ```
//!
//! Resolution walks the tag path through the [`SchemaRegistry`], records
//! every join it needs in a [`JoinState`] owned by the current compile, and
//! returns a [`ColumnDescriptor`] with the escaped SQL fragment.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::dialect::{Dialect, SqlDialect};
use super::query::CompilerOptions;
use crate::error::{CompileError, CompileResult};
use crate::ident;
use crate::schema::{JoinEntry, JoinKind, SchemaRegistry};

static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+) (?i:as) ([a-z0-9_-]{1,64})$").unwrap());

static WILDCARD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\*(\d*)$").unwrap());

static FUNC_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A parsed field string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReference {
    /// Set by a leading `#`; `column` then holds the raw text.
    pub raw: bool,
    /// Join tag chain.
    pub path: Vec<String>,
    /// Column name, or `*`.
    pub column: String,
    /// Join depth of a `*n` wildcard (`*` alone is depth 0).
    pub wildcard: Option<usize>,
    pub func: Option<String>,
    pub alias: Option<String>,
}

impl ColumnReference {
    pub fn parse(field: &str) -> CompileResult<Self> {
        if let Some(raw) = field.strip_prefix('#') {
            return Ok(Self {
                raw: true,
                path: Vec::new(),
                column: raw.to_string(),
                wildcard: None,
                func: None,
                alias: None,
            });
        }
        if field.is_empty() {
            return Err(CompileError::invalid_field(field, "empty field"));
        }
        if field.trim() != field {
            return Err(CompileError::invalid_field(
                field,
                "leading or trailing whitespace",
            ));
        }

        let (expr, alias) = match ALIAS_RE.captures(field) {
            Some(caps) => (
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map(|m| m.as_str().to_string()),
            ),
            None => (field, None),
        };
        if expr.chars().any(char::is_whitespace) {
            return Err(CompileError::invalid_field(field, "embedded whitespace"));
        }

        let (path, column, func) = match expr.find('(') {
            Some(open) => {
                let Some(arg) = expr[open + 1..].strip_suffix(')') else {
                    return Err(CompileError::invalid_field(field, "unbalanced parenthesis"));
                };
                let (head_path, func) = split_path(&expr[..open]);
                if func.is_empty() {
                    return Err(CompileError::invalid_field(field, "empty function name"));
                }
                if !FUNC_NAME_RE.is_match(func) {
                    return Err(CompileError::invalid_field(field, "invalid function name"));
                }
                if arg.is_empty() {
                    return Err(CompileError::invalid_field(field, "empty function argument"));
                }
                let (arg_path, column) = split_path(arg);
                if !head_path.is_empty() && !arg_path.is_empty() {
                    return Err(CompileError::invalid_field(
                        field,
                        "join path given both before and inside the function",
                    ));
                }
                let path = if head_path.is_empty() { arg_path } else { head_path };
                (path, column, Some(func.to_string()))
            }
            None => {
                let (path, column) = split_path(expr);
                (path, column, None)
            }
        };

        let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        for tag in &path {
            ident::validate(tag)?;
        }

        let wildcard = match WILDCARD_RE.captures(column) {
            Some(caps) => match caps.get(1).map(|m| m.as_str()) {
                Some(digits) if !digits.is_empty() => Some(digits.parse::<usize>().map_err(|_| {
                    CompileError::invalid_field(field, "wildcard depth is out of range")
                })?),
                _ => Some(0),
            },
            None => None,
        };
        let column = match wildcard {
            Some(depth) if depth > 0 && func.is_some() => {
                return Err(CompileError::invalid_field(
                    field,
                    "a depth wildcard cannot be a function argument",
                ));
            }
            Some(_) => "*".to_string(),
            None => ident::validate(column)?.to_string(),
        };
        // `count(*)` is an argument, not a selection wildcard.
        let wildcard = if func.is_some() { None } else { wildcard };

        Ok(Self {
            raw: false,
            path,
            column,
            wildcard,
            func,
            alias,
        })
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard.is_some()
    }
}

/// `a.b.c` -> (["a", "b"], "c")
fn split_path(s: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = s.split('.').collect();
    let last = parts.pop().unwrap_or("");
    (parts, last)
}

/// A resolved field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Escaped, alias-qualified SQL.
    pub sql: String,
    /// Table that owns the column.
    pub table: String,
    /// Output name for joined columns: path and column joined by the link string.
    pub label: String,
    /// Function name as emitted, empty if none.
    pub func: String,
    pub path: Vec<String>,
    pub alias: Option<String>,
    pub raw: bool,
}

/// A join some field of the current compile needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredJoin {
    pub path: Vec<String>,
    pub entry: JoinEntry,
    /// Name the ON clause uses for the source side.
    pub source_ref: String,
    pub target_alias: String,
}

/// Joins accumulated during one compile.
///
/// Created fresh for every compile and dropped with it; deduplicates by
/// tag path from the base table.
#[derive(Debug, Default)]
pub struct JoinState {
    joins: Vec<RequiredJoin>,
    seen: HashSet<Vec<String>>,
}

impl JoinState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn joins(&self) -> &[RequiredJoin] {
        &self.joins
    }

    fn add(&mut self, join: RequiredJoin) {
        if self.seen.insert(join.path.clone()) {
            self.joins.push(join);
        }
    }
}

/// Resolves field strings against one base table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnResolver<'a> {
    registry: &'a SchemaRegistry,
    options: &'a CompilerOptions,
    table: &'a str,
    base_alias: Option<&'a str>,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        options: &'a CompilerOptions,
        table: &'a str,
        base_alias: Option<&'a str>,
    ) -> Self {
        Self {
            registry,
            options,
            table,
            base_alias,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.options.dialect
    }

    pub fn table(&self) -> &'a str {
        self.table
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    /// Name that qualifies base-table columns.
    pub fn base_ref(&self) -> &'a str {
        self.base_alias.unwrap_or(self.table)
    }

    /// Derived alias for a joined tag path.
    pub fn derived_alias(&self, path: &[String]) -> String {
        format!("{}{}", self.options.alias_prefix, path.join("__"))
    }

    /// Parse and resolve a field string.
    pub fn resolve(&self, field: &str, joins: &mut JoinState) -> CompileResult<ColumnDescriptor> {
        let reference = ColumnReference::parse(field)?;
        self.resolve_reference(&reference, joins)
    }

    pub fn resolve_reference(
        &self,
        reference: &ColumnReference,
        joins: &mut JoinState,
    ) -> CompileResult<ColumnDescriptor> {
        if reference.raw {
            return Ok(ColumnDescriptor {
                sql: reference.column.clone(),
                table: self.table.to_string(),
                label: reference.column.clone(),
                func: String::new(),
                path: Vec::new(),
                alias: None,
                raw: true,
            });
        }

        let dialect = self.dialect();
        let (owner, qualifier) = self.walk(&reference.path, joins)?;

        if reference.column != "*" && !owner.has_column(&reference.column) {
            return Err(CompileError::UnknownColumn {
                table: owner.name.clone(),
                column: reference.column.clone(),
            });
        }

        let column_sql = if reference.column == "*" {
            if reference.func.is_some() && reference.path.is_empty() {
                "*".to_string()
            } else {
                format!("{}.*", dialect.quote_identifier(&qualifier))
            }
        } else {
            format!(
                "{}.{}",
                dialect.quote_identifier(&qualifier),
                dialect.quote_identifier(&reference.column)
            )
        };

        let (sql, func) = match &reference.func {
            Some(name) => {
                let emitted = dialect
                    .remap_function(name)
                    .map(str::to_string)
                    .unwrap_or_else(|| name.to_uppercase());
                (format!("{}({})", emitted, column_sql), emitted)
            }
            None => (column_sql, String::new()),
        };

        let label = if reference.path.is_empty() {
            reference.column.clone()
        } else {
            let link = &self.options.link;
            format!("{}{}{}", reference.path.join(link), link, reference.column)
        };

        Ok(ColumnDescriptor {
            sql,
            table: owner.name.clone(),
            label,
            func,
            path: reference.path.clone(),
            alias: reference.alias.clone(),
            raw: false,
        })
    }

    /// Follow `path`, recording joins; returns the owning table and the
    /// name its columns are qualified with.
    fn walk(
        &self,
        path: &[String],
        joins: &mut JoinState,
    ) -> CompileResult<(&'a crate::schema::TableSchema, String)> {
        let dialect = self.dialect();
        let mut owner = self.registry.table(self.table)?;
        let mut qualifier = self.base_ref().to_string();

        for depth in 1..=path.len() {
            let so_far = &path[..depth];
            let tag = &path[depth - 1];
            let entry = self.registry.resolve(&owner.name, tag)?;
            if entry.kind == JoinKind::Full && !dialect.supports_full_outer_join() {
                return Err(CompileError::unsupported(dialect.name(), "FULL JOIN"));
            }
            let target_alias = self.derived_alias(so_far);
            joins.add(RequiredJoin {
                path: so_far.to_vec(),
                entry: entry.clone(),
                source_ref: qualifier,
                target_alias: target_alias.clone(),
            });
            owner = self.registry.table(&entry.target)?;
            qualifier = target_alias;
        }
        Ok((owner, qualifier))
    }

    /// Render one required join as a clause.
    pub fn join_clause(&self, join: &RequiredJoin) -> String {
        let dialect = self.dialect();
        let mut clause = format!(
            "{} {}{}{}",
            join.entry.kind.keyword(),
            dialect.quote_identifier(&join.entry.target),
            dialect.table_alias_keyword(),
            dialect.quote_identifier(&join.target_alias)
        );
        if !join.entry.on.is_empty() && join.entry.kind.requires_on() {
            let on = join
                .entry
                .on
                .iter()
                .map(|(source, target)| {
                    format!(
                        "{}.{}={}.{}",
                        dialect.quote_identifier(&join.source_ref),
                        dialect.quote_identifier(source),
                        dialect.quote_identifier(&join.target_alias),
                        dialect.quote_identifier(target)
                    )
                })
                .collect::<Vec<_>>()
                .join(" AND ");
            clause.push_str(" ON ");
            clause.push_str(&on);
        }
        clause
    }
}
