#![deny(missing_docs)]
//! Sieve predicate facade crate.
//!
//! Filters compare one column against one literal. Every value is
//! canonicalized before an operator runs: integer widths collapse to 64-bit
//! signed integers and float widths to 64-bit floats, so a stored `i32` and an
//! `i64` literal compare by value. Survivor row sets are plain ascending
//! vectors combined with a linear intersection.

mod core;

pub use core::{
    canonicalize, intersection, overlap_hashed, overlap_nested_loop, overlaps, BoundFilter,
    CanonicalValue, ColumnFilter, ColumnRef, EvalError, Filter, Opaque, Operand, Operator,
    OperatorError, RowId, RowIdIter, RowSelection, RowSet, Value, ValueKind,
    OVERLAP_HASH_THRESHOLD,
};
