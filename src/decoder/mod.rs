//! Decoder boundary consumed by the filter engine.
//!
//! The engine never sees pages, encodings or compression. It only resolves
//! column paths, walks single-column streams forward and reads whole rows in
//! batches. Two implementations ship with the crate: [`ArrowDecoder`] over
//! in-memory record batches and [`ParquetDecoder`] over a parquet file.

mod error;
pub mod parquet_file;
pub mod record_batch;

use std::sync::Arc;

pub use error::DecodeError;
use sieve_predicate::Value;

pub use self::{
    parquet_file::ParquetDecoder,
    record_batch::{ArrowDecoder, ArrowRow},
};

/// A column path resolved against the decoder's schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Path as the caller wrote it.
    pub path: Arc<str>,
    /// Decoder-specific location of the column.
    pub internal: String,
    /// True when the column holds zero or more values per row.
    pub repeated: bool,
}

/// Forward-only stream over one column's values.
pub trait ColumnStream {
    /// Advances past `n` rows without decoding them.
    fn skip(&mut self, n: usize) -> Result<(), DecodeError>;

    /// Reads the value of the next row.
    ///
    /// Repeated columns return every value of that row as [`Value::List`].
    fn read_one(&mut self) -> Result<Value, DecodeError>;
}

/// Forward-only stream over whole decoded rows.
pub trait RowStream {
    /// Decoded row type.
    type Row;

    /// Advances past `n` rows without materializing them.
    fn skip(&mut self, n: usize) -> Result<(), DecodeError>;

    /// Reads up to `n` rows in file order.
    fn read_n(&mut self, n: usize) -> Result<Vec<Self::Row>, DecodeError>;
}

/// Source of decoded columns and rows for one file.
pub trait Decoder {
    /// Decoded row type handed back to callers.
    type Row;
    /// Stream type returned by [`Decoder::open_column`].
    type Columns: ColumnStream;
    /// Stream type returned by [`Decoder::open_rows`].
    type Rows: RowStream<Row = Self::Row>;

    /// Total number of rows in the file.
    fn row_count(&self) -> usize;

    /// Resolves a caller path into a column location and repetition kind.
    fn resolve_path(&self, path: &str) -> Result<ResolvedColumn, DecodeError>;

    /// Opens a fresh stream positioned at row 0 of the column.
    fn open_column(&self, column: &ResolvedColumn) -> Result<Self::Columns, DecodeError>;

    /// Opens a fresh row stream positioned at row 0.
    fn open_rows(&self) -> Result<Self::Rows, DecodeError>;

    /// Decodes every row of the file in order.
    fn read_all_rows(&self) -> Result<Vec<Self::Row>, DecodeError>;

    /// Row count of the first row group, when the file has one.
    fn row_group_rows(&self) -> Option<usize> {
        None
    }
}
