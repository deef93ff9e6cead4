//! Query assembler - compile a [`Select`] into SQL text.
//!
//! Compiling is a pure function of the descriptor, the schema registry and
//! the options. Join requirements are collected in a [`JoinState`] that lives
//! only for one [`Compiler::compile`] call; the result is an immutable
//! [`CompiledQuery`] that renders the full statement, the COUNT wrapper and
//! the bare WHERE fragment.

use std::collections::HashSet;

use super::column::{ColumnReference, ColumnResolver, JoinState};
use super::condition::{self, Conditions, Linker};
use super::dialect::{Dialect, Limit, Pagination, SqlDialect};
use super::value::Sql;
use crate::error::{CompileError, CompileResult};
use crate::ident;
use crate::schema::SchemaRegistry;

/// Options shared by every compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    pub dialect: Dialect,
    /// Prefix of derived join aliases (`orm_tb2`).
    pub alias_prefix: String,
    /// Joins path segments and the column in output names (`tb2.name`).
    pub link: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            alias_prefix: "orm_".to_string(),
            link: ".".to_string(),
        }
    }
}

impl CompilerOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }
}

// =============================================================================
// Select descriptor
// =============================================================================

/// A SELECT as the caller describes it.
///
/// The descriptor holds no compile state; compiling never mutates it and
/// it can be compiled any number of times, from any number of threads.
#[derive(Debug, Clone, PartialEq, Default)]
#[must_use = "Select has no effect until compiled"]
pub struct Select {
    pub table: String,
    pub alias: Option<String>,
    pub fields: Vec<String>,
    pub conditions: Conditions,
    pub group_by: Vec<String>,
    pub having: Conditions,
    pub order_by: Vec<String>,
    pub limit: Limit,
    pub distinct: bool,
    pub for_update: bool,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Alias the base table (`FROM t AS a`).
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn having(mut self, conditions: Conditions) -> Self {
        self.having = conditions;
        self
    }

    /// Order by fields; `-field` sorts descending, `+field` or `field` ascending.
    pub fn order_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Limit::Count(count);
        self
    }

    pub fn page(mut self, offset: u64, count: u64) -> Self {
        self.limit = Limit::Range { offset, count };
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }
}

// =============================================================================
// Compiled plan
// =============================================================================

/// The immutable result of compiling a [`Select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    dialect: Dialect,
    distinct: bool,
    columns: Vec<String>,
    from: String,
    joins: Vec<String>,
    where_clause: String,
    group_by: Vec<String>,
    having: String,
    order_by: Vec<String>,
    pagination: Option<Pagination>,
    for_update: Option<&'static str>,
}

impl CompiledQuery {
    /// Selected column expressions, escaped.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// JOIN clauses in the order they were first required.
    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    /// The WHERE fragment without the keyword; empty when nothing filters.
    pub fn to_where_sql(&self) -> &str {
        &self.where_clause
    }

    /// The full statement.
    pub fn to_sql(&self) -> String {
        let mut parts = self.head(true);

        if !self.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by.join(",")));
        } else if matches!(self.pagination, Some(Pagination::Tail(_)))
            && self.dialect.requires_order_by_for_offset()
        {
            parts.push("ORDER BY (SELECT NULL)".to_string());
        }
        if let Some(Pagination::Tail(tail)) = &self.pagination {
            parts.push(tail.clone());
        }
        if let Some(lock) = self.for_update {
            parts.push(lock.to_string());
        }
        parts.join(" ")
    }

    /// The full statement as a sub-query operand (`col__in`, `col__eq`, ...).
    pub fn to_subquery(&self) -> Sql {
        Sql::new(self.to_sql())
    }

    /// `SELECT COUNT(*) AS c FROM (<select without order/limit/lock>) AS count_tb`.
    pub fn to_count_sql(&self) -> String {
        let inner = self.head(false).join(" ");
        format!(
            "SELECT COUNT(*) AS c FROM ({}){}count_tb",
            inner,
            self.dialect.table_alias_keyword()
        )
    }

    /// SELECT through HAVING. Pagination that lives in the head (TOP,
    /// ROWNUM) is only applied when `paginate` is set.
    fn head(&self, paginate: bool) -> Vec<String> {
        let mut parts = vec!["SELECT".to_string()];
        if self.distinct {
            parts.push("DISTINCT".to_string());
        }
        if paginate {
            if let Some(Pagination::Top(top)) = &self.pagination {
                parts.push(top.clone());
            }
        }
        parts.push(self.columns.join(","));
        parts.push(format!("FROM {}", self.from));
        parts.extend(self.joins.iter().cloned());

        let predicate = match &self.pagination {
            Some(Pagination::Predicate(p)) if paginate => Some(p.as_str()),
            _ => None,
        };
        match (self.where_clause.is_empty(), predicate) {
            (true, None) => {}
            (false, None) => parts.push(format!("WHERE {}", self.where_clause)),
            (true, Some(p)) => parts.push(format!("WHERE {}", p)),
            (false, Some(p)) => parts.push(format!("WHERE ({}) and {}", self.where_clause, p)),
        }

        if !self.group_by.is_empty() {
            parts.push(format!("GROUP BY {}", self.group_by.join(",")));
            if !self.having.is_empty() {
                parts.push(format!("HAVING {}", self.having));
            }
        }
        parts
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Compiles descriptors against a built [`SchemaRegistry`].
#[derive(Debug, Clone)]
pub struct Compiler<'a> {
    pub(crate) registry: &'a SchemaRegistry,
    pub(crate) options: CompilerOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(registry: &'a SchemaRegistry, options: CompilerOptions) -> Self {
        Self { registry, options }
    }

    pub fn with_dialect(registry: &'a SchemaRegistry, dialect: Dialect) -> Self {
        Self::new(registry, CompilerOptions::new(dialect))
    }

    pub fn dialect(&self) -> Dialect {
        self.options.dialect
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile `select` into an immutable plan.
    pub fn compile(&self, select: &Select) -> CompileResult<CompiledQuery> {
        if !self.registry.is_built() {
            return Err(CompileError::NotBuilt);
        }
        let dialect = self.options.dialect;
        let table = self.registry.table(&select.table)?;
        if let Some(alias) = &select.alias {
            ident::validate(alias)?;
        }

        let resolver =
            ColumnResolver::new(self.registry, &self.options, &table.name, select.alias.as_deref());
        let mut joins = JoinState::new();

        let columns = self.select_list(&resolver, &mut joins, select)?;
        let where_clause =
            condition::compile(&resolver, &mut joins, &select.conditions, Linker::And)?;

        let mut group_by = Vec::with_capacity(select.group_by.len());
        for field in &select.group_by {
            group_by.push(resolver.resolve(field, &mut joins)?.sql);
        }
        // HAVING without GROUP BY is never emitted, so it must not add joins either.
        let having = if group_by.is_empty() {
            condition::compile(&resolver, &mut JoinState::new(), &select.having, Linker::And)?;
            String::new()
        } else {
            condition::compile(&resolver, &mut joins, &select.having, Linker::And)?
        };

        let mut order_by = Vec::with_capacity(select.order_by.len());
        for field in &select.order_by {
            order_by.push(order_term(&resolver, &mut joins, field)?);
        }

        let has_order = !order_by.is_empty();

        let from = match &select.alias {
            Some(alias) => format!(
                "{}{}{}",
                dialect.quote_identifier(&table.name),
                dialect.table_alias_keyword(),
                dialect.quote_identifier(alias)
            ),
            None => dialect.quote_identifier(&table.name),
        };

        Ok(CompiledQuery {
            dialect,
            distinct: select.distinct,
            columns,
            from,
            joins: joins
                .joins()
                .iter()
                .map(|j| resolver.join_clause(j))
                .collect(),
            where_clause,
            group_by,
            having,
            order_by,
            pagination: dialect.emit_pagination(select.limit, has_order),
            for_update: if select.for_update {
                dialect.for_update()
            } else {
                None
            },
        })
    }

    /// Shorthand for `compile(select)?.to_sql()`.
    pub fn to_sql(&self, select: &Select) -> CompileResult<String> {
        Ok(self.compile(select)?.to_sql())
    }

    /// Shorthand for `compile(select)?.to_count_sql()`.
    pub fn to_count_sql(&self, select: &Select) -> CompileResult<String> {
        Ok(self.compile(select)?.to_count_sql())
    }

    /// Shorthand for `compile(select)?.to_subquery()`.
    pub fn subquery(&self, select: &Select) -> CompileResult<Sql> {
        Ok(self.compile(select)?.to_subquery())
    }

    /// Shorthand for the WHERE fragment of `select`.
    pub fn to_where_sql(&self, select: &Select) -> CompileResult<String> {
        Ok(self.compile(select)?.to_where_sql().to_string())
    }

    /// Unzip wildcards, apply exclusions, then resolve what survives.
    fn select_list(
        &self,
        resolver: &ColumnResolver<'_>,
        joins: &mut JoinState,
        select: &Select,
    ) -> CompileResult<Vec<String>> {
        let mut included: Vec<String> = Vec::new();
        let mut excluded: HashSet<String> = HashSet::new();

        for field in &select.fields {
            if let Some(rest) = field.strip_prefix('-') {
                if rest.starts_with('#') {
                    return Err(CompileError::RawExclusion(field.clone()));
                }
                excluded.extend(self.unzip(resolver, rest)?);
            } else if let Some(rest) = field.strip_prefix('#') {
                if rest.starts_with('-') {
                    return Err(CompileError::RawExclusion(field.clone()));
                }
                included.push(field.clone());
            } else {
                included.extend(self.unzip(resolver, field)?);
            }
        }
        if included.is_empty() {
            included = self.unzip(resolver, "*")?;
        }

        let mut seen = HashSet::new();
        let survivors: Vec<String> = included
            .into_iter()
            .filter(|f| !excluded.contains(f))
            .filter(|f| seen.insert(f.clone()))
            .collect();
        if survivors.is_empty() {
            return Err(CompileError::AllExcluded);
        }

        let dialect = self.options.dialect;
        let mut columns = Vec::with_capacity(survivors.len());
        for field in &survivors {
            let d = resolver.resolve(field, joins)?;
            let output = match (&d.alias, d.raw) {
                (_, true) => d.sql,
                (Some(alias), false) => format!("{} AS {}", d.sql, dialect.quote_identifier(alias)),
                (None, false) if !d.path.is_empty() && d.func.is_empty() => {
                    format!("{} AS {}", d.sql, dialect.quote_identifier(&d.label))
                }
                (None, false) => d.sql,
            };
            columns.push(output);
        }
        Ok(columns)
    }

    /// Expand one selection entry into concrete field strings.
    fn unzip(&self, resolver: &ColumnResolver<'_>, field: &str) -> CompileResult<Vec<String>> {
        let reference = ColumnReference::parse(field)?;
        match reference.wildcard {
            Some(depth) => self
                .registry
                .expand_wildcard(resolver.table(), &reference.path, depth),
            None => Ok(vec![field.to_string()]),
        }
    }
}

/// One ORDER BY term.
fn order_term(
    resolver: &ColumnResolver<'_>,
    joins: &mut JoinState,
    field: &str,
) -> CompileResult<String> {
    let (direction, field) = if let Some(rest) = field.strip_prefix('-') {
        ("DESC", rest)
    } else if let Some(rest) = field.strip_prefix('+') {
        ("ASC", rest)
    } else {
        ("ASC", field)
    };
    let d = resolver.resolve(field, joins)?;
    if d.alias.is_some() {
        return Err(CompileError::invalid_field(
            field,
            "output aliases are not allowed in ORDER BY",
        ));
    }
    Ok(format!("{} {}", d.sql, direction))
}
