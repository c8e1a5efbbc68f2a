use std::{fmt, sync::Arc};

use super::CanonicalValue;

/// Reference identifying a column used inside filters.
///
/// This is a logical path only. Resolution against the file schema happens
/// when a filter pass runs, not at construction time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Column path as written by the caller, e.g. `"price"` or `"address.city"`.
    pub name: Arc<str>,
}

impl ColumnRef {
    /// Creates a new column reference from a path.
    #[must_use]
    pub fn new<N>(name: N) -> Self
    where
        N: Into<Arc<str>>,
    {
        Self { name: name.into() }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One side of a filter: a column or a literal.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// Reference to a column.
    Column(ColumnRef),
    /// Literal value.
    Literal(CanonicalValue),
}

impl Operand {
    /// Shorthand for [`Operand::Column`].
    #[must_use]
    pub fn column<N>(name: N) -> Self
    where
        N: Into<Arc<str>>,
    {
        Self::Column(ColumnRef::new(name))
    }

    /// Shorthand for [`Operand::Literal`]; the value is canonicalized on the way in.
    #[must_use]
    pub fn literal<V>(value: V) -> Self
    where
        V: Into<CanonicalValue>,
    {
        Self::Literal(value.into())
    }

    /// Returns the column reference, if this operand is one.
    #[must_use]
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Operand::Column(column) => Some(column),
            Operand::Literal(_) => None,
        }
    }
}

impl From<ColumnRef> for Operand {
    fn from(value: ColumnRef) -> Self {
        Self::Column(value)
    }
}

impl From<CanonicalValue> for Operand {
    fn from(value: CanonicalValue) -> Self {
        Self::Literal(value)
    }
}
