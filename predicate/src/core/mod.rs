//! Core filter structures shared by the sieve reader.

mod error;
mod eval;
mod filter;
mod op;
mod operand;
mod row_set;
mod value;

pub use error::{EvalError, OperatorError};
pub use eval::{overlap_hashed, overlap_nested_loop, overlaps, OVERLAP_HASH_THRESHOLD};
pub use filter::{BoundFilter, ColumnFilter, Filter};
pub use op::Operator;
pub use operand::{ColumnRef, Operand};
pub use row_set::{intersection, RowId, RowIdIter, RowSelection, RowSet};
pub use value::{canonicalize, CanonicalValue, Opaque, Value, ValueKind};
