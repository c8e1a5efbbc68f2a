#![deny(missing_docs)]
//! Filter pushdown over column-chunked table files.
//!
//! A [`FilterReader`] registers per-column filters, scans only the referenced
//! columns to find the surviving rows, and then materializes just those rows
//! through a buffered forward-only cursor. Decoding is delegated to a
//! [`Decoder`]: [`ParquetDecoder`] reads parquet files, [`ArrowDecoder`] reads
//! in-memory Arrow record batches.
//!
//! ```no_run
//! use sieve::{FilterReader, Operator, ParquetDecoder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let decoder = ParquetDecoder::open("trades.parquet")?;
//! let mut reader = FilterReader::new(decoder);
//! reader
//!     .filter_column("venue", Operator::Equal, "XSTO")
//!     .filter_column("volume", Operator::Greater, 1_000i64);
//! reader.apply()?;
//! let rows = reader.read_all()?;
//! assert_eq!(rows.len(), reader.filtered_len());
//! # Ok(())
//! # }
//! ```

pub mod decoder;
mod logging;
/// Session options.
pub mod option;
pub mod reader;

pub use sieve_predicate as predicate;
pub use sieve_predicate::{
    BoundFilter, CanonicalValue, ColumnRef, EvalError, Filter, Operand, Operator, OperatorError,
    RowId, RowSelection, RowSet, Value,
};

pub use crate::{
    decoder::{
        ArrowDecoder, ArrowRow, ColumnStream, DecodeError, Decoder, ParquetDecoder,
        ResolvedColumn, RowStream,
    },
    option::{BufferSize, ReaderOptions},
    reader::{FilterError, FilterReader, Rows, SessionState},
};
