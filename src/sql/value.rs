//! Operand values and their dialect-specific literal form.
//!
//! A [`Value`] is what sits on the right-hand side of a condition or in an
//! INSERT row. [`format`] turns it into SQL literal text for one dialect;
//! nothing user-supplied reaches the output without passing through it.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use super::dialect::SqlDialect;
use crate::error::{CompileError, CompileResult};

/// SQL text produced by this crate's own compiler, such as a subquery.
///
/// There is no public constructor: arbitrary strings cannot be smuggled in
/// as pre-rendered SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sql(String);

impl Sql {
    pub(crate) fn new(text: String) -> Self {
        Sql(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Sql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An operand value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Timestamp(NaiveDateTime),
    List(Vec<Value>),
    Sql(Sql),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::UInt(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "array",
            Value::Sql(_) => "subquery",
        }
    }

    /// Convert a JSON scalar or array.
    ///
    /// Objects are rejected: nested condition trees are handled by the
    /// condition parser, never as operand values.
    pub fn from_json(json: &serde_json::Value) -> CompileResult<Self> {
        use serde_json::Value as Json;
        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::Str(s.clone()),
            Json::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<CompileResult<Vec<_>>>()?,
            ),
            Json::Object(_) => {
                return Err(CompileError::InvalidOperand {
                    op: "value".into(),
                    expected: "a scalar or array".into(),
                    got: "object".into(),
                })
            }
        })
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => UInt,
    u64 => UInt,
    f64 => Float,
    String => Str,
    NaiveDateTime => Timestamp,
    Sql => Sql,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A rendered literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub sql: String,
    /// Set for the zero timestamp, which write statements skip.
    pub is_empty: bool,
}

impl Literal {
    fn new(sql: String) -> Self {
        Literal {
            sql,
            is_empty: false,
        }
    }
}

/// Whether `ts` is `0001-01-01 00:00:00`, the "unset" timestamp.
pub fn is_zero_timestamp(ts: &NaiveDateTime) -> bool {
    ts.year() == 1 && ts.ordinal() == 1 && ts.num_seconds_from_midnight() == 0
}

/// Render `value` as a literal for `dialect`.
///
/// Lists render as `(a,b,c)`; subqueries are parenthesized.
pub fn format(dialect: &dyn SqlDialect, value: &Value) -> CompileResult<Literal> {
    match value {
        Value::Null => Ok(Literal::new("NULL".into())),
        Value::Bool(b) => Ok(Literal::new(dialect.format_bool(*b).into())),
        Value::Int(i) => Ok(Literal::new(i.to_string())),
        Value::UInt(u) => Ok(Literal::new(u.to_string())),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(CompileError::NonFiniteFloat(*f));
            }
            let mut buf = ryu::Buffer::new();
            Ok(Literal::new(buf.format_finite(*f).to_string()))
        }
        Value::Str(s) => Ok(Literal::new(dialect.quote_string(s))),
        Value::Timestamp(ts) => Ok(Literal {
            sql: format_timestamp(dialect, ts),
            is_empty: is_zero_timestamp(ts),
        }),
        Value::List(items) => {
            let parts = items
                .iter()
                .map(|v| format(dialect, v).map(|l| l.sql))
                .collect::<CompileResult<Vec<_>>>()?;
            Ok(Literal::new(format!("({})", parts.join(","))))
        }
        Value::Sql(sql) => Ok(Literal::new(format!("({})", sql))),
    }
}

pub(crate) fn format_timestamp(dialect: &dyn SqlDialect, ts: &NaiveDateTime) -> String {
    dialect.format_timestamp(&ts.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Interpret a value as a calendar day for the `date` operator.
pub(crate) fn as_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Timestamp(ts) => Some(ts.date()),
        Value::Str(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ts| ts.date())
            })
            .ok(),
        _ => None,
    }
}
