//! Decoder over a parquet file, read as Arrow record batches.
//!
//! Streams sit on a `ParquetRecordBatchReader`. A skip that stays inside the
//! decoded batch only moves an offset; a longer skip drops the reader, and
//! the next read reopens it with a row selection that starts at the target
//! row, beginning at the row group holding it. Skipped rows are therefore
//! never decoded. Column streams project the file to the top-level field
//! that holds the column.

use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{datatypes::SchemaRef, record_batch::RecordBatch};
use parquet::{
    arrow::{
        arrow_reader::{
            ArrowReaderMetadata, ArrowReaderOptions, ParquetRecordBatchReader,
            ParquetRecordBatchReaderBuilder, RowSelection, RowSelector,
        },
        ProjectionMask,
    },
    file::metadata::ParquetMetaData,
};
use sieve_predicate::Value;

use super::{
    record_batch::{decode_row, is_repeated, lookup_field, nested_cell, nested_segments},
    ArrowRow, ColumnStream, DecodeError, Decoder, ResolvedColumn, RowStream,
};

/// Rows decoded per record batch.
pub const DEFAULT_BATCH_ROWS: usize = 1024;

/// [`Decoder`] over a parquet file on the local file system.
#[derive(Clone)]
pub struct ParquetDecoder {
    path: PathBuf,
    metadata: ArrowReaderMetadata,
    // First row of each row group.
    group_starts: Arc<[usize]>,
    rows: usize,
}

impl fmt::Debug for ParquetDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParquetDecoder")
            .field("path", &self.path)
            .field("rows", &self.rows)
            .field("row_groups", &self.group_starts.len())
            .finish()
    }
}

impl ParquetDecoder {
    /// Opens the file and reads its footer.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref().to_path_buf();
        let metadata = ArrowReaderMetadata::load(&File::open(&path)?, ArrowReaderOptions::new())?;
        let mut group_starts = Vec::with_capacity(metadata.metadata().num_row_groups());
        let mut rows = 0;
        for group in metadata.metadata().row_groups() {
            group_starts.push(rows);
            rows += usize::try_from(group.num_rows()).unwrap_or(0);
        }
        Ok(Self {
            path,
            metadata,
            group_starts: group_starts.into(),
            rows,
        })
    }

    /// Footer metadata of the file.
    pub fn metadata(&self) -> &ParquetMetaData {
        self.metadata.metadata()
    }

    /// Arrow schema the file decodes to.
    pub fn schema(&self) -> &SchemaRef {
        self.metadata.schema()
    }

    // Reader yielding rows `from..` of the projected columns.
    fn reader_from(
        &self,
        projection: &ProjectionMask,
        from: usize,
    ) -> Result<ParquetRecordBatchReader, DecodeError> {
        let group = self.group_starts.partition_point(|start| *start <= from).saturating_sub(1);
        let group_start = self.group_starts.get(group).copied().unwrap_or(0);
        let mut selectors = Vec::with_capacity(2);
        if from > group_start {
            selectors.push(RowSelector::skip(from - group_start));
        }
        selectors.push(RowSelector::select(self.rows - from));

        let file = File::open(&self.path)?;
        let reader = ParquetRecordBatchReaderBuilder::new_with_metadata(file, self.metadata.clone())
            .with_projection(projection.clone())
            .with_batch_size(DEFAULT_BATCH_ROWS)
            .with_row_groups((group..self.group_starts.len()).collect())
            .with_row_selection(RowSelection::from(selectors))
            .build()?;
        Ok(reader)
    }

    fn batches(&self, projection: ProjectionMask) -> Batches {
        Batches {
            decoder: self.clone(),
            projection,
            position: 0,
            reader: None,
            reader_position: 0,
            batch: None,
        }
    }
}

impl Decoder for ParquetDecoder {
    type Row = ArrowRow;
    type Columns = ParquetColumnStream;
    type Rows = ParquetRowStream;

    fn row_count(&self) -> usize {
        self.rows
    }

    fn resolve_path(&self, path: &str) -> Result<ResolvedColumn, DecodeError> {
        let (_, field) = lookup_field(self.schema(), path)?;
        Ok(ResolvedColumn {
            path: path.into(),
            internal: path.to_owned(),
            repeated: is_repeated(&field),
        })
    }

    fn open_column(&self, column: &ResolvedColumn) -> Result<Self::Columns, DecodeError> {
        let (index, _) = lookup_field(self.schema(), &column.internal)?;
        let projection = ProjectionMask::roots(self.metadata.parquet_schema(), [index]);
        Ok(ParquetColumnStream {
            batches: self.batches(projection),
            nested: nested_segments(&column.internal),
        })
    }

    fn open_rows(&self) -> Result<Self::Rows, DecodeError> {
        Ok(ParquetRowStream {
            batches: self.batches(ProjectionMask::all()),
        })
    }

    fn read_all_rows(&self) -> Result<Vec<Self::Row>, DecodeError> {
        let mut rows = Vec::with_capacity(self.rows);
        if self.rows == 0 {
            return Ok(rows);
        }
        for batch in self.reader_from(&ProjectionMask::all(), 0)? {
            let batch = batch?;
            for row in 0..batch.num_rows() {
                rows.push(decode_row(&batch, row)?);
            }
        }
        Ok(rows)
    }

    fn row_group_rows(&self) -> Option<usize> {
        self.metadata()
            .row_groups()
            .first()
            .map(|group| usize::try_from(group.num_rows()).unwrap_or(0))
    }
}

// Forward-only position over the decoded batches of one projection.
struct Batches {
    decoder: ParquetDecoder,
    projection: ProjectionMask,
    // Next row handed out.
    position: usize,
    reader: Option<ParquetRecordBatchReader>,
    // First row of the next batch `reader` yields.
    reader_position: usize,
    // Current batch and its first row.
    batch: Option<(RecordBatch, usize)>,
}

impl Batches {
    fn total(&self) -> usize {
        self.decoder.rows
    }

    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        let target = self.position + n;
        if target > self.total() {
            return Err(DecodeError::OutOfRange {
                requested: target,
                available: self.total(),
            });
        }
        self.position = target;
        if target >= self.reader_position + DEFAULT_BATCH_ROWS {
            self.reader = None;
        }
        Ok(())
    }

    // Batch holding `position`, with the row's offset inside it.
    fn current(&mut self) -> Result<(&RecordBatch, usize), DecodeError> {
        let covered = matches!(
            &self.batch,
            Some((batch, start)) if (*start..start + batch.num_rows()).contains(&self.position)
        );
        if !covered {
            self.batch = None;
            self.fill()?;
        }
        match &self.batch {
            Some((batch, start)) => Ok((batch, self.position - start)),
            None => Err(DecodeError::OutOfRange {
                requested: self.position,
                available: self.total(),
            }),
        }
    }

    fn fill(&mut self) -> Result<(), DecodeError> {
        let out_of_range = DecodeError::OutOfRange {
            requested: self.position,
            available: self.total(),
        };
        if self.position >= self.total() {
            return Err(out_of_range);
        }
        if self.reader.is_none() || self.position < self.reader_position {
            self.reader = Some(self.decoder.reader_from(&self.projection, self.position)?);
            self.reader_position = self.position;
        }
        let Some(reader) = self.reader.as_mut() else {
            return Err(out_of_range);
        };
        loop {
            let batch = match reader.next() {
                Some(batch) => batch?,
                None => return Err(out_of_range),
            };
            let start = self.reader_position;
            self.reader_position += batch.num_rows();
            if self.position < self.reader_position {
                self.batch = Some((batch, start));
                return Ok(());
            }
        }
    }
}

/// Projected column stream of a [`ParquetDecoder`].
pub struct ParquetColumnStream {
    batches: Batches,
    nested: Vec<String>,
}

impl ColumnStream for ParquetColumnStream {
    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.batches.skip(n)
    }

    fn read_one(&mut self) -> Result<Value, DecodeError> {
        let (batch, offset) = self.batches.current()?;
        let value = nested_cell(batch.column(0).as_ref(), &self.nested, offset)?;
        self.batches.position += 1;
        Ok(value)
    }
}

/// Whole-row stream of a [`ParquetDecoder`].
pub struct ParquetRowStream {
    batches: Batches,
}

impl RowStream for ParquetRowStream {
    type Row = ArrowRow;

    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.batches.skip(n)
    }

    fn read_n(&mut self, n: usize) -> Result<Vec<ArrowRow>, DecodeError> {
        let end = self.batches.total().min(self.batches.position + n);
        let mut rows = Vec::with_capacity(end - self.batches.position);
        while self.batches.position < end {
            let (batch, offset) = self.batches.current()?;
            let row = decode_row(batch, offset)?;
            rows.push(row);
            self.batches.position += 1;
        }
        Ok(rows)
    }
}
