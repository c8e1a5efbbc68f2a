use std::sync::Arc;

use sieve_predicate::{ColumnRef, EvalError};
use thiserror::Error;

use crate::decoder::DecodeError;

/// Errors surfaced by a [`FilterReader`](super::FilterReader).
#[derive(Debug, Error)]
pub enum FilterError {
    /// A filter references a path absent from the schema.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    /// An operator rejected the values it was given.
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// The decoder failed while a column or row stream was being read.
    #[error("decode failed at row {row}{}: {source}", column_suffix(.column))]
    Decode {
        /// Column being scanned, `None` for whole-row reads.
        column: Option<Arc<str>>,
        /// Physical row offset being accessed.
        row: usize,
        /// Decoder failure.
        #[source]
        source: DecodeError,
    },
    /// Both sides of a filter are columns.
    #[error("filter compares column '{left}' with column '{right}', only literals are supported")]
    ColumnComparison {
        /// Left column.
        left: ColumnRef,
        /// Right column.
        right: ColumnRef,
    },
    /// The last apply pass failed, so there is no survivor set to read.
    #[error("survivor set is undefined after a failed apply")]
    InvalidSurvivors,
    /// The row cursor hit a decoder failure and must be rewound with
    /// [`reset`](super::FilterReader::reset) before reading again.
    #[error("row cursor closed after a decode failure, reset to read again")]
    CursorFailed,
}

fn column_suffix(column: &Option<Arc<str>>) -> String {
    match column {
        Some(column) => format!(" of column '{column}'"),
        None => String::new(),
    }
}

impl FilterError {
    pub(crate) fn decode(column: Option<&Arc<str>>, row: usize, source: DecodeError) -> Self {
        match source {
            DecodeError::UnknownColumn(path) => FilterError::UnknownColumn(path),
            source => FilterError::Decode {
                column: column.cloned(),
                row,
                source,
            },
        }
    }
}
