use std::sync::Arc;

use super::{CanonicalValue, ColumnRef, EvalError, Operand, Operator};

/// Filter as registered by a caller: `left op right`.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    /// Left operand.
    pub left: Operand,
    /// Operator.
    pub op: Operator,
    /// Right operand.
    pub right: Operand,
}

impl Filter {
    /// Creates a filter from any two operands.
    #[must_use]
    pub fn new<L, R>(left: L, op: Operator, right: R) -> Self
    where
        L: Into<Operand>,
        R: Into<Operand>,
    {
        Self {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    /// Normalizes the filter so evaluation never re-inspects operand sides.
    #[must_use]
    pub fn bind(self) -> BoundFilter {
        match (self.left, self.right) {
            (Operand::Column(column), Operand::Literal(literal)) => {
                BoundFilter::Column(ColumnFilter {
                    column: column.name,
                    op: self.op,
                    literal,
                    swapped: false,
                })
            }
            (Operand::Literal(literal), Operand::Column(column)) => {
                BoundFilter::Column(ColumnFilter {
                    column: column.name,
                    op: self.op,
                    literal,
                    swapped: true,
                })
            }
            (Operand::Column(left), Operand::Column(right)) => {
                BoundFilter::ColumnPair { left, right }
            }
            (Operand::Literal(_), Operand::Literal(_)) => BoundFilter::Constant,
        }
    }
}

/// Registration-time normal form of a [`Filter`].
#[derive(Clone, Debug, PartialEq)]
pub enum BoundFilter {
    /// Exactly one side is a column.
    Column(ColumnFilter),
    /// Both sides are columns; no evaluation rule exists for this shape.
    ColumnPair {
        /// Left column.
        left: ColumnRef,
        /// Right column.
        right: ColumnRef,
    },
    /// No column referenced; never restricts the row set.
    Constant,
}

impl BoundFilter {
    /// Returns the column filter when exactly one side is a column.
    #[must_use]
    pub fn as_column(&self) -> Option<&ColumnFilter> {
        match self {
            BoundFilter::Column(filter) => Some(filter),
            _ => None,
        }
    }
}

impl From<Filter> for BoundFilter {
    fn from(filter: Filter) -> Self {
        filter.bind()
    }
}

/// Filter normalized to `(column, op, literal, swapped)`.
///
/// `swapped` records that the literal was written on the left, in which case
/// the operator runs as `literal op value`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnFilter {
    /// Column path the filter reads.
    pub column: Arc<str>,
    /// Operator.
    pub op: Operator,
    /// Literal operand.
    pub literal: CanonicalValue,
    /// True when the literal was the left operand.
    pub swapped: bool,
}

impl ColumnFilter {
    /// Evaluates the filter against one canonical column value.
    pub fn matches(&self, value: &CanonicalValue) -> Result<bool, EvalError> {
        let result = if self.swapped {
            self.op.evaluate(&self.literal, value)
        } else {
            self.op.evaluate(value, &self.literal)
        };
        result.map_err(|source| EvalError {
            column: self.column.clone(),
            source,
        })
    }
}
