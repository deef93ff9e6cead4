//! The closed set of condition operators.
//!
//! A condition key is `field__suffix`; the suffix parses into an
//! [`Operator`]. Anything outside this set is a `SyntaxError`, so a typo
//! never degrades into an equality test.
//!
//! | Suffix                                   | Meaning                                  |
//! |------------------------------------------|------------------------------------------|
//! | `eq` `ne` `lt` `lte` `gt` `gte`          | comparison (`eq`/`ne` with null: IS NULL)|
//! | `bin_eq` ... `bin_gte`                   | comparison forced case-sensitive         |
//! | `in` `nin` `bin_in` `bin_nin`            | membership                               |
//! | `between`                                | inclusive range, exactly two values      |
//! | `date`                                   | whole calendar day                       |
//! | `null`                                   | `true` IS NULL, `false` IS NOT NULL      |
//! | `[or_][i](startswith|endswith|contains|customlike)` | LIKE patterns                 |
//! | `regex` `iregex`                         | regular expression match                 |

use crate::error::{CompileError, CompileResult};

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "eq" => CompareOp::Eq,
            "ne" => CompareOp::Ne,
            "lt" => CompareOp::Lt,
            "lte" => CompareOp::Lte,
            "gt" => CompareOp::Gt,
            "gte" => CompareOp::Gte,
            _ => return None,
        })
    }
}

/// Where the `%` wildcards go around a LIKE operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikePattern {
    StartsWith,
    EndsWith,
    Contains,
    /// Operand is used verbatim; the caller supplies wildcards.
    Custom,
}

impl LikePattern {
    /// Wrap `text` in wildcards.
    pub fn apply(&self, text: &str) -> String {
        match self {
            LikePattern::StartsWith => format!("{}%", text),
            LikePattern::EndsWith => format!("%{}", text),
            LikePattern::Contains => format!("%{}%", text),
            LikePattern::Custom => text.to_string(),
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            LikePattern::StartsWith => "startswith",
            LikePattern::EndsWith => "endswith",
            LikePattern::Contains => "contains",
            LikePattern::Custom => "customlike",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "startswith" => LikePattern::StartsWith,
            "endswith" => LikePattern::EndsWith,
            "contains" => LikePattern::Contains,
            "customlike" => LikePattern::Custom,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Compare { op: CompareOp, binary: bool },
    In { negated: bool, binary: bool },
    Between,
    Date,
    Null,
    Like {
        pattern: LikePattern,
        ignore_case: bool,
        /// Array operands are ORed instead of ANDed.
        any: bool,
    },
    Regex { ignore_case: bool },
}

impl Operator {
    pub const EQ: Operator = Operator::Compare {
        op: CompareOp::Eq,
        binary: false,
    };

    /// Parse an operator suffix such as `lte`, `bin_in` or `or_icontains`.
    pub fn parse(suffix: &str) -> CompileResult<Self> {
        let unknown = || CompileError::UnknownOperator(suffix.to_string());

        match suffix {
            "between" => return Ok(Operator::Between),
            "date" => return Ok(Operator::Date),
            "null" => return Ok(Operator::Null),
            "regex" => return Ok(Operator::Regex { ignore_case: false }),
            "iregex" => return Ok(Operator::Regex { ignore_case: true }),
            _ => {}
        }

        let (binary, rest) = match suffix.strip_prefix("bin_") {
            Some(rest) => (true, rest),
            None => (false, suffix),
        };
        if let Some(op) = CompareOp::parse(rest) {
            return Ok(Operator::Compare { op, binary });
        }
        match rest {
            "in" => return Ok(Operator::In { negated: false, binary }),
            "nin" => return Ok(Operator::In { negated: true, binary }),
            _ if binary => return Err(unknown()),
            _ => {}
        }

        let (any, rest) = match suffix.strip_prefix("or_") {
            Some(rest) => (true, rest),
            None => (false, suffix),
        };
        if let Some(pattern) = LikePattern::parse(rest) {
            return Ok(Operator::Like {
                pattern,
                ignore_case: false,
                any,
            });
        }
        if let Some(pattern) = rest.strip_prefix('i').and_then(LikePattern::parse) {
            return Ok(Operator::Like {
                pattern,
                ignore_case: true,
                any,
            });
        }
        Err(unknown())
    }
}

impl std::str::FromStr for Operator {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::parse(s)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Compare { op, binary } => {
                if *binary {
                    f.write_str("bin_")?;
                }
                f.write_str(op.suffix())
            }
            Operator::In { negated, binary } => {
                if *binary {
                    f.write_str("bin_")?;
                }
                f.write_str(if *negated { "nin" } else { "in" })
            }
            Operator::Between => f.write_str("between"),
            Operator::Date => f.write_str("date"),
            Operator::Null => f.write_str("null"),
            Operator::Like {
                pattern,
                ignore_case,
                any,
            } => {
                if *any {
                    f.write_str("or_")?;
                }
                if *ignore_case {
                    f.write_str("i")?;
                }
                f.write_str(pattern.suffix())
            }
            Operator::Regex { ignore_case } => {
                f.write_str(if *ignore_case { "iregex" } else { "regex" })
            }
        }
    }
}
