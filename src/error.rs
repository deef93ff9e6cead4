//! Error types shared by every stage of compilation.
//!
//! Each concrete failure is its own variant so callers can match on it,
//! and every variant belongs to exactly one [`ErrorKind`]:
//!
//! | Kind         | Raised for                                                   |
//! |--------------|--------------------------------------------------------------|
//! | `Schema`     | unregistered table/tag, duplicate registration, build order |
//! | `Syntax`     | malformed field strings, unknown operators, all-excluded     |
//! | `Value`      | operand arity/type problems (`between`, empty arrays, NaN)   |
//! | `Dialect`    | operator or statement unsupported on the active engine       |
//! | `Validation` | identifiers failing the `[a-z0-9_-]{1,64}` policy            |
//!
//! Errors are fatal to the single compile call that raised them; the
//! compiler never returns partially built SQL.

/// Coarse classification of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Schema,
    Syntax,
    Value,
    Dialect,
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Value => "ValueError",
            ErrorKind::Dialect => "DialectError",
            ErrorKind::Validation => "ValidationError",
        };
        f.write_str(name)
    }
}

/// Errors raised while registering schemas or compiling SQL.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    // === Schema ===
    #[error("Table already registered: {0}")]
    DuplicateTable(String),

    #[error("Model already registered: {0}")]
    DuplicateModel(String),

    #[error("Unregistered table: {0}")]
    UnknownTable(String),

    #[error("Tag `{tag}` already registered on table `{table}`")]
    DuplicateTag { table: String, tag: String },

    #[error("Unregistered tag `{tag}` on table `{table}`")]
    UnregisteredTag { table: String, tag: String },

    #[error("Join `{table}.{tag}` targets unregistered model `{target}`")]
    UnknownJoinTarget {
        table: String,
        tag: String,
        target: String,
    },

    #[error("Join `{table}.{tag}` needs at least one ON column pair")]
    MissingJoinColumns { table: String, tag: String },

    #[error("Column `{column}` is not declared on table `{table}`")]
    UnknownColumn { table: String, column: String },

    #[error("Schema registry has already been built")]
    AlreadyBuilt,

    #[error("Schema registry has not been built yet")]
    NotBuilt,

    #[error("Joins were declared but no tables are registered")]
    NoTables,

    // === Syntax ===
    #[error("Invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Unknown operator `{0}`")]
    UnknownOperator(String),

    #[error("Fields cannot be all excluded")]
    AllExcluded,

    #[error("Raw fields are not allowed here: {0}")]
    RawNotAllowed(String),

    #[error("Field `{0}` requires a join, which this statement cannot carry")]
    JoinNotAllowed(String),

    // === Value ===
    #[error("Operator `{op}` expects {expected}, got {got}")]
    InvalidOperand {
        op: String,
        expected: String,
        got: String,
    },

    #[error("`between` expects exactly 2 values, got {0}")]
    BetweenArity(usize),

    #[error("Operator `{0}` needs a non-empty array")]
    EmptyArray(String),

    #[error("Cannot render {0} as a SQL literal")]
    NonFiniteFloat(f64),

    #[error("Statement has no columns to write")]
    EmptyRow,

    // === Dialect ===
    #[error("{what} is not supported by {dialect}")]
    Unsupported { dialect: String, what: String },

    #[error("Unknown dialect `{0}`")]
    UnknownDialect(String),

    // === Validation ===
    #[error("Invalid identifier `{0}`: must match [a-z0-9_-]{{1,64}}")]
    InvalidIdentifier(String),

    #[error("Field `{0}` cannot be both raw (#) and excluded (-)")]
    RawExclusion(String),
}

impl CompileError {
    /// The coarse kind this failure belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::DuplicateTable(_)
            | CompileError::DuplicateModel(_)
            | CompileError::UnknownTable(_)
            | CompileError::DuplicateTag { .. }
            | CompileError::UnregisteredTag { .. }
            | CompileError::UnknownJoinTarget { .. }
            | CompileError::MissingJoinColumns { .. }
            | CompileError::UnknownColumn { .. }
            | CompileError::AlreadyBuilt
            | CompileError::NotBuilt
            | CompileError::NoTables => ErrorKind::Schema,

            CompileError::InvalidField { .. }
            | CompileError::UnknownOperator(_)
            | CompileError::AllExcluded
            | CompileError::RawNotAllowed(_)
            | CompileError::JoinNotAllowed(_) => ErrorKind::Syntax,

            CompileError::InvalidOperand { .. }
            | CompileError::BetweenArity(_)
            | CompileError::EmptyArray(_)
            | CompileError::NonFiniteFloat(_)
            | CompileError::EmptyRow => ErrorKind::Value,

            CompileError::Unsupported { .. } | CompileError::UnknownDialect(_) => {
                ErrorKind::Dialect
            }

            CompileError::InvalidIdentifier(_) | CompileError::RawExclusion(_) => {
                ErrorKind::Validation
            }
        }
    }

    pub(crate) fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        CompileError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(dialect: &str, what: impl Into<String>) -> Self {
        CompileError::Unsupported {
            dialect: dialect.to_string(),
            what: what.into(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
