//! Filter operators.

use std::{fmt, str::FromStr};

use super::OperatorError;

/// Operator applied between a column value and a literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equals (`=`).
    Equal,
    /// Not equals (`!=`, also accepted as `<>`).
    NotEqual,
    /// Less than (`<`).
    Less,
    /// Less than or equal to (`<=`).
    LessEqual,
    /// Greater than (`>`).
    Greater,
    /// Greater than or equal to (`>=`).
    GreaterEqual,
    /// Membership of a scalar in a sequence, or overlap of two sequences.
    In,
    /// Sequences share at least one element (`&&`).
    Overlap,
    /// String prefix or suffix match with a single `%` wildcard.
    Like,
}

impl Operator {
    /// Returns a textual representation of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::In => "in",
            Operator::Overlap => "&&",
            Operator::Like => "like",
        }
    }

    /// Returns true for the four ordering comparisons.
    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::Less | Operator::LessEqual | Operator::Greater | Operator::GreaterEqual
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = OperatorError;

    fn from_str(symbol: &str) -> Result<Self, Self::Err> {
        let op = match symbol.trim() {
            "=" => Operator::Equal,
            "!=" | "<>" => Operator::NotEqual,
            "<" => Operator::Less,
            "<=" => Operator::LessEqual,
            ">" => Operator::Greater,
            ">=" => Operator::GreaterEqual,
            "&&" => Operator::Overlap,
            other if other.eq_ignore_ascii_case("in") => Operator::In,
            other if other.eq_ignore_ascii_case("like") => Operator::Like,
            other => return Err(OperatorError::UnknownSymbol(other.to_owned())),
        };
        Ok(op)
    }
}
