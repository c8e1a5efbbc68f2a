use std::sync::Arc;

use thiserror::Error;

use super::{Operator, ValueKind};

/// Failure of a single operator application.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperatorError {
    /// Operands of incompatible canonical kinds.
    #[error("cannot apply {op} to {left} and {right}")]
    TypeMismatch {
        /// Operator being applied.
        op: Operator,
        /// Kind of the left operand.
        left: ValueKind,
        /// Kind of the right operand.
        right: ValueKind,
    },
    /// A sequence operator received something other than a sequence.
    #[error("{op} expects a sequence operand, got {kind}")]
    NotASequence {
        /// Operator being applied.
        op: Operator,
        /// Kind that was found instead.
        kind: ValueKind,
    },
    /// `in` received a left side that is neither a scalar nor a sequence.
    #[error("{op} expects a scalar or sequence on the left, got {kind}")]
    NotAScalar {
        /// Operator being applied.
        op: Operator,
        /// Kind that was found instead.
        kind: ValueKind,
    },
    /// `like` pattern with no wildcard, several wildcards, or an interior one.
    #[error("unsupported like pattern '{pattern}': expected a single leading or trailing '%'")]
    UnsupportedPattern {
        /// Offending pattern.
        pattern: String,
    },
    /// Operator symbol that does not name any operator.
    #[error("unknown operator symbol '{0}'")]
    UnknownSymbol(String),
}

/// Operator failure attributed to the column being filtered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("filter on column '{column}' failed: {source}")]
pub struct EvalError {
    /// Column path of the failing filter.
    pub column: Arc<str>,
    /// Underlying operator failure.
    #[source]
    pub source: OperatorError,
}
