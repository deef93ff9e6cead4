//! Operator rendering.
//!
//! [`render`] is the single place that maps every [`Operator`] onto SQL.
//! The match is exhaustive, and the engine-specific pieces (case folding,
//! regex) are required trait methods, so a backend cannot omit an operator.

use chrono::Duration;

use super::SqlDialect;
use crate::error::{CompileError, CompileResult};
use crate::sql::operator::{CompareOp, LikePattern, Operator};
use crate::sql::value::{self, Value};

/// Render `column <op> value`. `column` must already be escaped.
pub fn render(
    dialect: &dyn SqlDialect,
    op: Operator,
    column: &str,
    value: &Value,
) -> CompileResult<String> {
    match op {
        Operator::Compare { op: cmp, binary } => compare(dialect, op, cmp, binary, column, value),
        Operator::In { negated, binary } => membership(dialect, op, negated, binary, column, value),
        Operator::Between => between(dialect, op, column, value),
        Operator::Date => date(dialect, op, column, value),
        Operator::Null => match value {
            Value::Bool(true) => Ok(format!("{} is null", column)),
            Value::Bool(false) => Ok(format!("{} is not null", column)),
            other => Err(invalid(op, "a bool", other)),
        },
        Operator::Like {
            pattern,
            ignore_case,
            any,
        } => like(dialect, op, pattern, ignore_case, any, column, value),
        Operator::Regex { ignore_case } => {
            let pattern = match value {
                Value::Str(s) => dialect.quote_string(s),
                other => return Err(invalid(op, "a string", other)),
            };
            dialect.regex_match(column, &pattern, ignore_case)
        }
    }
}

fn invalid(op: Operator, expected: &str, got: &Value) -> CompileError {
    CompileError::InvalidOperand {
        op: op.to_string(),
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    }
}

fn compare(
    dialect: &dyn SqlDialect,
    op: Operator,
    cmp: CompareOp,
    binary: bool,
    column: &str,
    value: &Value,
) -> CompileResult<String> {
    match (cmp, value) {
        (CompareOp::Eq, Value::Null) => return Ok(format!("{} is null", column)),
        (CompareOp::Ne, Value::Null) => return Ok(format!("{} is not null", column)),
        (_, Value::Null) | (_, Value::List(_)) => {
            return Err(invalid(op, "a scalar", value));
        }
        _ => {}
    }
    let literal = value::format(dialect, value)?;
    let column = if binary {
        dialect.force_case_sensitive(column)
    } else {
        column.to_string()
    };
    Ok(format!("{}{}{}", column, cmp.symbol(), literal.sql))
}

fn membership(
    dialect: &dyn SqlDialect,
    op: Operator,
    negated: bool,
    binary: bool,
    column: &str,
    value: &Value,
) -> CompileResult<String> {
    let list = match value {
        Value::List(items) if items.is_empty() => {
            return Err(CompileError::EmptyArray(op.to_string()))
        }
        Value::List(_) | Value::Sql(_) => value::format(dialect, value)?.sql,
        Value::Null => return Err(invalid(op, "an array", value)),
        scalar => format!("({})", value::format(dialect, scalar)?.sql),
    };
    let column = if binary {
        dialect.force_case_sensitive(column)
    } else {
        column.to_string()
    };
    let keyword = if negated { "not in" } else { "in" };
    Ok(format!("{} {} {}", column, keyword, list))
}

fn between(
    dialect: &dyn SqlDialect,
    op: Operator,
    column: &str,
    value: &Value,
) -> CompileResult<String> {
    match value {
        Value::List(items) if items.len() == 2 => {
            let low = value::format(dialect, &items[0])?;
            let high = value::format(dialect, &items[1])?;
            Ok(format!("{} between {} and {}", column, low.sql, high.sql))
        }
        Value::List(items) => Err(CompileError::BetweenArity(items.len())),
        other => Err(invalid(op, "a 2-element array", other)),
    }
}

fn date(
    dialect: &dyn SqlDialect,
    op: Operator,
    column: &str,
    value: &Value,
) -> CompileResult<String> {
    let day = value::as_date(value).ok_or_else(|| invalid(op, "a YYYY-MM-DD date", value))?;
    let start = day.and_time(chrono::NaiveTime::MIN);
    let end = start
        .checked_add_signed(Duration::days(1))
        .ok_or_else(|| invalid(op, "a representable date", value))?;
    Ok(format!(
        "({}>={} and {}<{})",
        column,
        value::format_timestamp(dialect, &start),
        column,
        value::format_timestamp(dialect, &end)
    ))
}

fn like(
    dialect: &dyn SqlDialect,
    op: Operator,
    pattern: LikePattern,
    ignore_case: bool,
    any: bool,
    column: &str,
    value: &Value,
) -> CompileResult<String> {
    let one = |v: &Value| -> CompileResult<String> {
        let text = match v {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            other => return Err(invalid(op, "a string", other)),
        };
        let quoted = dialect.quote_string(&pattern.apply(&text));
        Ok(if ignore_case {
            dialect.like_ignore_case(column, &quoted)
        } else {
            format!("{} like {}", column, quoted)
        })
    };

    match value {
        Value::List(items) if items.is_empty() => Err(CompileError::EmptyArray(op.to_string())),
        Value::List(items) if items.len() == 1 => one(&items[0]),
        Value::List(items) => {
            let linker = if any { " or " } else { " and " };
            let parts = items.iter().map(one).collect::<CompileResult<Vec<_>>>()?;
            Ok(format!("({})", parts.join(linker)))
        }
        scalar => one(scalar),
    }
}
