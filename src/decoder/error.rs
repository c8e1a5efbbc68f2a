use thiserror::Error;

/// Failure reported by a [`Decoder`](super::Decoder) or one of its streams.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Path not present in the schema.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    /// Skip or read past the last row.
    #[error("row {requested} is out of range, the file holds {available} rows")]
    OutOfRange {
        /// Row that was asked for.
        requested: usize,
        /// Rows in the file.
        available: usize,
    },
    /// Error from the parquet reader.
    #[error("decoder parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    /// Error from arrow array access.
    #[error("decoder arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    /// Error opening or reading the file.
    #[error("decoder io error: {0}")]
    Io(#[from] std::io::Error),
    /// Column shape the decoder cannot stream.
    #[error("unsupported column layout: {0}")]
    Unsupported(String),
}
