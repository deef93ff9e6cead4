//! The condition DSL and its compiler.
//!
//! Conditions are an ordered list of `(key, operand)` pairs, so compiled
//! output always follows input order:
//!
//! ```ignore
//! let cond = Conditions::new()
//!     .with("name__startswith", "ab")
//!     .with("~id__in", vec![1, 2, 3])
//!     .group("$or", Conditions::new().with("age__lt", 18).with("age__gt", 65));
//! ```
//!
//! Keys are `field[__operator]`. A leading `~` negates the entry, a leading
//! `#` on the field marks already-escaped SQL, and `$or` / `$and` nest
//! either one tree or a list of trees.

use serde::Deserialize;

use super::column::{ColumnResolver, JoinState};
use super::dialect::operators;
use super::operator::Operator;
use super::value::Value;
use crate::error::{CompileError, CompileResult};

/// How sibling fragments are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linker {
    And,
    Or,
}

impl Linker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Linker::And => " and ",
            Linker::Or => " or ",
        }
    }

    fn for_key(key: &str) -> Option<Self> {
        match key {
            "$and" => Some(Linker::And),
            "$or" => Some(Linker::Or),
            _ => None,
        }
    }
}

/// Right-hand side of a condition entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    /// A single nested tree, for `$or` / `$and`.
    Group(Conditions),
    /// Several nested trees, each ANDed internally.
    Groups(Vec<Conditions>),
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<Conditions> for Operand {
    fn from(c: Conditions) -> Self {
        Operand::Group(c)
    }
}

impl From<Vec<Conditions>> for Operand {
    fn from(c: Vec<Conditions>) -> Self {
        Operand::Groups(c)
    }
}

/// An ordered condition tree.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct Conditions(Vec<(String, Operand)>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key: value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((key.into(), Operand::Value(value.into())));
        self
    }

    /// Append `key: { ... }`, usually with `$or` / `$and`.
    pub fn group(mut self, key: impl Into<String>, tree: Conditions) -> Self {
        self.0.push((key.into(), Operand::Group(tree)));
        self
    }

    /// Append `key: [{ ... }, { ... }]`.
    pub fn groups(mut self, key: impl Into<String>, trees: Vec<Conditions>) -> Self {
        self.0.push((key.into(), Operand::Groups(trees)));
        self
    }

    pub fn push(&mut self, key: impl Into<String>, operand: impl Into<Operand>) {
        self.0.push((key.into(), operand.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operand)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Operand)> for Conditions {
    fn from_iter<T: IntoIterator<Item = (String, Operand)>>(iter: T) -> Self {
        Conditions(iter.into_iter().collect())
    }
}

impl TryFrom<serde_json::Value> for Conditions {
    type Error = CompileError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Conditions::try_from(&json)
    }
}

impl TryFrom<&serde_json::Value> for Conditions {
    type Error = CompileError;

    /// Object keys keep document order (`serde_json` is built with
    /// `preserve_order`).
    fn try_from(json: &serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value as Json;

        let Json::Object(map) = json else {
            return Err(not_a_tree("conditions", json));
        };
        let mut out = Conditions::new();
        for (key, value) in map {
            let is_combinator = Linker::for_key(key.trim_start_matches('~')).is_some();
            let operand = match value {
                Json::Object(_) if is_combinator => Operand::Group(Conditions::try_from(value)?),
                Json::Array(items) if is_combinator => Operand::Groups(
                    items
                        .iter()
                        .map(|item| Conditions::try_from(item))
                        .collect::<CompileResult<Vec<_>>>()?,
                ),
                _ if is_combinator => return Err(not_a_tree(key, value)),
                other => Operand::Value(Value::from_json(other)?),
            };
            out.push(key.clone(), operand);
        }
        Ok(out)
    }
}

fn not_a_tree(key: &str, got: &serde_json::Value) -> CompileError {
    let got = match got {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    };
    CompileError::InvalidOperand {
        op: key.to_string(),
        expected: "a condition object or an array of them".into(),
        got: got.into(),
    }
}

/// Compile `conditions`, joining top-level entries with `linker`.
///
/// An empty tree compiles to the empty string.
pub fn compile(
    resolver: &ColumnResolver<'_>,
    joins: &mut JoinState,
    conditions: &Conditions,
    linker: Linker,
) -> CompileResult<String> {
    let mut parts = Vec::with_capacity(conditions.len());
    for (key, operand) in conditions.iter() {
        let (negated, key) = match key.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, key),
        };

        let fragment = match Linker::for_key(key) {
            Some(inner) => compile_combinator(resolver, joins, key, operand, inner)?,
            None => Some(compile_leaf(resolver, joins, key, operand)?),
        };
        let Some(fragment) = fragment else { continue };

        if negated {
            parts.push(negate(&fragment));
        } else {
            parts.push(fragment);
        }
    }
    Ok(parts.join(linker.as_str()))
}

fn compile_combinator(
    resolver: &ColumnResolver<'_>,
    joins: &mut JoinState,
    key: &str,
    operand: &Operand,
    linker: Linker,
) -> CompileResult<Option<String>> {
    match operand {
        Operand::Group(tree) => {
            let inner = compile(resolver, joins, tree, linker)?;
            Ok((!inner.is_empty()).then(|| format!("({})", inner)))
        }
        Operand::Groups(trees) => {
            let mut parts = Vec::with_capacity(trees.len());
            for tree in trees {
                let inner = compile(resolver, joins, tree, Linker::And)?;
                if !inner.is_empty() {
                    parts.push(inner);
                }
            }
            Ok((!parts.is_empty()).then(|| format!("({})", parts.join(linker.as_str()))))
        }
        Operand::Value(v) => Err(CompileError::InvalidOperand {
            op: key.to_string(),
            expected: "a condition object or an array of them".into(),
            got: v.type_name().into(),
        }),
    }
}

fn compile_leaf(
    resolver: &ColumnResolver<'_>,
    joins: &mut JoinState,
    key: &str,
    operand: &Operand,
) -> CompileResult<String> {
    let Operand::Value(value) = operand else {
        return Err(CompileError::InvalidOperand {
            op: key.to_string(),
            expected: "a value".into(),
            got: "condition tree".into(),
        });
    };

    let (field, op) = match key.split_once("__") {
        Some((field, suffix)) => (field, Operator::parse(suffix)?),
        None => (key, Operator::EQ),
    };

    let column = match field.strip_prefix('#') {
        Some(raw) => raw.to_string(),
        None => {
            let descriptor = resolver.resolve(field, joins)?;
            if descriptor.alias.is_some() {
                return Err(CompileError::invalid_field(
                    field,
                    "output aliases are not allowed in conditions",
                ));
            }
            if descriptor.sql.ends_with('*') {
                return Err(CompileError::invalid_field(
                    field,
                    "wildcards are not allowed in conditions",
                ));
            }
            descriptor.sql
        }
    };

    operators::render(&resolver.dialect(), op, &column, value)
}

/// `(not (frag))`, adding the inner parentheses only when needed.
fn negate(fragment: &str) -> String {
    if is_wrapped(fragment) {
        format!("(not {})", fragment)
    } else {
        format!("(not ({}))", fragment)
    }
}

/// Whether the opening `(` of `s` is closed by its final `)`.
///
/// Parentheses inside quoted literals and identifiers are ignored.
fn is_wrapped(s: &str) -> bool {
    if !s.starts_with('(') || !s.ends_with(')') {
        return false;
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let last = s.len() - 1;
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != last {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
