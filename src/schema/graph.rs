//! SchemaRegistry - the reference graph tables are joined through.
//!
//! Tables are nodes, resolved joins are edges. Registration is two-phase:
//! tables and join declarations are collected first, then [`SchemaRegistry::build`]
//! resolves every join's target model and freezes the registry. After that
//! it is read-only and may be shared by any number of concurrent compiles.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

use super::{JoinDeclaration, JoinKind, TableSchema};
use crate::error::{CompileError, CompileResult};
use crate::ident;

/// A join resolved to its concrete target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEntry {
    pub table: String,
    pub tag: String,
    pub kind: JoinKind,
    pub on: Vec<(String, String)>,
    pub target: String,
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: Vec<TableSchema>,
    table_indices: HashMap<String, usize>,
    /// Model (struct id) -> table name.
    models: HashMap<String, String>,
    declarations: Vec<JoinDeclaration>,

    graph: DiGraph<String, JoinEntry>,
    node_indices: HashMap<String, NodeIndex>,
    /// Outgoing joins per table, in declaration order.
    joins: HashMap<String, Vec<EdgeIndex>>,
    built: bool,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table.
    ///
    /// Fails if the name, model or any column is already taken or fails the
    /// identifier policy, or if a key names an undeclared column.
    pub fn register_table(&mut self, schema: TableSchema) -> CompileResult<()> {
        if self.built {
            return Err(CompileError::AlreadyBuilt);
        }
        ident::validate(&schema.name)?;
        for column in &schema.columns {
            ident::validate(column)?;
        }
        if self.table_indices.contains_key(&schema.name) {
            return Err(CompileError::DuplicateTable(schema.name));
        }
        if self.models.contains_key(&schema.model) {
            return Err(CompileError::DuplicateModel(schema.model));
        }
        for key in schema.primary_key.iter().chain(&schema.unique_keys) {
            if !schema.has_column(key) {
                return Err(CompileError::UnknownColumn {
                    table: schema.name.clone(),
                    column: key.clone(),
                });
            }
        }

        tracing::debug!(
            table = %schema.name,
            model = %schema.model,
            columns = schema.columns.len(),
            "registered table"
        );
        self.table_indices.insert(schema.name.clone(), self.tables.len());
        self.models.insert(schema.model.clone(), schema.name.clone());
        self.tables.push(schema);
        Ok(())
    }

    /// Declare a join. Targets are resolved later, by [`build`](Self::build).
    pub fn register_join(&mut self, join: JoinDeclaration) -> CompileResult<()> {
        if self.built {
            return Err(CompileError::AlreadyBuilt);
        }
        ident::validate(&join.table)?;
        ident::validate(&join.tag)?;
        if join.tag.contains("__") {
            return Err(CompileError::invalid_field(
                &join.tag,
                "join tags cannot contain `__`",
            ));
        }
        if self
            .declarations
            .iter()
            .any(|d| d.table == join.table && d.tag == join.tag)
        {
            return Err(CompileError::DuplicateTag {
                table: join.table,
                tag: join.tag,
            });
        }
        if join.kind.requires_on() && join.on.is_empty() {
            return Err(CompileError::MissingJoinColumns {
                table: join.table,
                tag: join.tag,
            });
        }
        for (source, target) in &join.on {
            ident::validate(source)?;
            ident::validate(target)?;
        }

        tracing::debug!(
            table = %join.table,
            tag = %join.tag,
            kind = %join.kind,
            target = %join.target_model,
            "declared join"
        );
        self.declarations.push(join);
        Ok(())
    }

    /// Resolve every declared join and freeze the registry.
    ///
    /// May run exactly once.
    pub fn build(&mut self) -> CompileResult<()> {
        if self.built {
            return Err(CompileError::AlreadyBuilt);
        }
        if self.tables.is_empty() && !self.declarations.is_empty() {
            return Err(CompileError::NoTables);
        }

        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        for table in &self.tables {
            let idx = graph.add_node(table.name.clone());
            node_indices.insert(table.name.clone(), idx);
        }

        let mut joins: HashMap<String, Vec<EdgeIndex>> = HashMap::new();
        for decl in &self.declarations {
            let source = self.table(&decl.table)?;
            let target_name = self.models.get(&decl.target_model).ok_or_else(|| {
                CompileError::UnknownJoinTarget {
                    table: decl.table.clone(),
                    tag: decl.tag.clone(),
                    target: decl.target_model.clone(),
                }
            })?;
            let target = self.table(target_name)?;

            for (source_col, target_col) in &decl.on {
                for (schema, column) in [(source, source_col), (target, target_col)] {
                    if !schema.has_column(column) {
                        return Err(CompileError::UnknownColumn {
                            table: schema.name.clone(),
                            column: column.clone(),
                        });
                    }
                }
            }

            let entry = JoinEntry {
                table: decl.table.clone(),
                tag: decl.tag.clone(),
                kind: decl.kind,
                on: decl.on.clone(),
                target: target.name.clone(),
            };
            let edge = graph.add_edge(node_indices[&decl.table], node_indices[&target.name], entry);
            joins.entry(decl.table.clone()).or_default().push(edge);
        }

        tracing::info!(
            tables = self.tables.len(),
            joins = self.declarations.len(),
            "schema registry built"
        );
        self.graph = graph;
        self.node_indices = node_indices;
        self.joins = joins;
        self.built = true;
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Look up a registered table.
    pub fn table(&self, name: &str) -> CompileResult<&TableSchema> {
        self.table_indices
            .get(name)
            .map(|&i| &self.tables[i])
            .ok_or_else(|| CompileError::UnknownTable(name.to_string()))
    }

    /// Registered tables in registration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.iter()
    }

    /// Joins declared on `table`, in declaration order.
    pub fn joins_of(&self, table: &str) -> impl Iterator<Item = &JoinEntry> {
        self.joins
            .get(table)
            .into_iter()
            .flatten()
            .map(|&edge| &self.graph[edge])
    }

    /// Resolve the join `tag` declared on `table`.
    pub fn resolve(&self, table: &str, tag: &str) -> CompileResult<&JoinEntry> {
        if !self.built {
            return Err(CompileError::NotBuilt);
        }
        self.joins_of(table)
            .find(|entry| entry.tag == tag)
            .ok_or_else(|| CompileError::UnregisteredTag {
                table: table.to_string(),
                tag: tag.to_string(),
            })
    }

    /// Walk a tag path from `table` and return the table it lands on.
    pub fn resolve_path(&self, table: &str, tag_path: &[String]) -> CompileResult<&TableSchema> {
        let mut current = self.table(table)?;
        for tag in tag_path {
            let entry = self.resolve(&current.name, tag)?;
            current = self.table(&entry.target)?;
        }
        Ok(current)
    }

    /// Expand a wildcard.
    ///
    /// Depth 0 yields the columns of the table addressed by `tag_path`; each
    /// further level adds the columns of every table one more join hop away,
    /// breadth first, each hop in declaration order. Joined columns come back
    /// as dotted references (`tb2.name`) prefixed by the cumulative path.
    ///
    /// There is no visited set: a cyclic join graph is walked until `depth`
    /// runs out, so callers must always bound it.
    pub fn expand_wildcard(
        &self,
        table: &str,
        tag_path: &[String],
        depth: usize,
    ) -> CompileResult<Vec<String>> {
        if !self.built {
            return Err(CompileError::NotBuilt);
        }
        let addressed = self.resolve_path(table, tag_path)?;

        let mut out = Vec::new();
        push_columns(&mut out, tag_path, addressed);

        let mut frontier = vec![(addressed.name.as_str(), tag_path.to_vec())];
        for _ in 0..depth {
            let mut next = Vec::new();
            for (name, path) in &frontier {
                for entry in self.joins_of(name) {
                    let mut hop = path.clone();
                    hop.push(entry.tag.clone());
                    let target = self.table(&entry.target)?;
                    push_columns(&mut out, &hop, target);
                    next.push((target.name.as_str(), hop));
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        Ok(out)
    }
}

fn push_columns(out: &mut Vec<String>, path: &[String], table: &TableSchema) {
    if path.is_empty() {
        out.extend(table.columns.iter().cloned());
    } else {
        let prefix = path.join(".");
        out.extend(table.columns.iter().map(|c| format!("{}.{}", prefix, c)));
    }
}
