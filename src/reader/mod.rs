//! Filter sessions over a single decoder.
//!
//! A [`FilterReader`] accumulates filters, computes the survivor set with
//! [`FilterReader::apply`], and hands surviving rows back either through the
//! buffered cursor ([`FilterReader::next_row`], [`FilterReader::read_all`],
//! [`FilterReader::rows`]) or in one full decode ([`FilterReader::all_brute`]).

mod apply;
mod cursor;
mod error;

use std::{sync::Arc, time::Instant};

pub use error::FilterError;
use log::Level;
use sieve_predicate::{
    BoundFilter, CanonicalValue, Filter, Operand, Operator, RowId, RowSelection, RowSet,
};

use self::cursor::RowCursor;
use crate::{
    decoder::{DecodeError, Decoder},
    logging::sieve_log,
    option::ReaderOptions,
};

/// Lifecycle of a [`FilterReader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No apply pass has run; every row survives.
    Created,
    /// Survivor set fixed by the last apply, cursor rewound.
    Applied,
    /// Cursor has served at least one survivor.
    Reading,
    /// Cursor has served every survivor.
    Exhausted,
    /// The last apply failed; the survivor set is undefined.
    Invalid,
}

#[derive(Debug)]
enum Survivors {
    Unfiltered,
    Selected(RowSelection),
    Invalid,
}

/// Filter pushdown session bound to one decoder.
///
/// Not meant to be shared across threads: apply and materialization both
/// move the decoder streams owned by the session.
pub struct FilterReader<D: Decoder> {
    decoder: D,
    rows: usize,
    filters: Vec<BoundFilter>,
    survivors: Survivors,
    cursor: RowCursor<D::Rows>,
    state: SessionState,
}

impl<D: Decoder> FilterReader<D> {
    /// Creates a session with default options.
    pub fn new(decoder: D) -> Self {
        Self::with_options(decoder, ReaderOptions::default())
    }

    /// Creates a session; the read-ahead window is sized from `options`.
    pub fn with_options(decoder: D, options: ReaderOptions) -> Self {
        let rows = decoder.row_count();
        let capacity = options.buffer_capacity(decoder.row_group_rows());
        sieve_log!(
            Level::Debug,
            "session_open",
            "rows={} buffer_rows={}",
            rows,
            capacity
        );
        Self {
            decoder,
            rows,
            filters: Vec::new(),
            survivors: Survivors::Unfiltered,
            cursor: RowCursor::new(capacity),
            state: SessionState::Created,
        }
    }

    /// Registers `left op right`. Takes effect on the next [`apply`](Self::apply).
    pub fn filter<L, R>(&mut self, left: L, op: Operator, right: R) -> &mut Self
    where
        L: Into<Operand>,
        R: Into<Operand>,
    {
        self.add_filter(Filter::new(left, op, right))
    }

    /// Registers `column op literal`.
    pub fn filter_column<V>(
        &mut self,
        column: impl Into<Arc<str>>,
        op: Operator,
        literal: V,
    ) -> &mut Self
    where
        V: Into<CanonicalValue>,
    {
        self.add_filter(Filter::new(
            Operand::column(column),
            op,
            Operand::literal(literal),
        ))
    }

    /// Registers a prebuilt filter.
    pub fn add_filter(&mut self, filter: Filter) -> &mut Self {
        self.filters.push(filter.bind());
        self
    }

    /// Filters registered so far, in registration order.
    pub fn filters(&self) -> &[BoundFilter] {
        &self.filters
    }

    /// Total rows in the file.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// True when the file holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Rows surviving the last apply; all rows before the first one.
    pub fn filtered_len(&self) -> usize {
        match &self.survivors {
            Survivors::Unfiltered => self.rows,
            Survivors::Selected(selection) => selection.len(),
            Survivors::Invalid => 0,
        }
    }

    /// Survivor set of the last successful apply.
    pub fn survivors(&self) -> Option<&RowSelection> {
        match &self.survivors {
            Survivors::Selected(selection) => Some(selection),
            Survivors::Unfiltered | Survivors::Invalid => None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Rows decoded per cursor refill.
    pub fn buffer_rows(&self) -> usize {
        self.cursor.capacity()
    }

    /// Borrows the underlying decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Discards the window and rewinds the row stream and cursor to row 0.
    pub fn reset(&mut self) -> Result<(), FilterError> {
        let started = Instant::now();
        let stream = self
            .decoder
            .open_rows()
            .map_err(|source| FilterError::decode(None, 0, source))?;
        self.cursor.rewind(stream);
        self.state = match self.survivors {
            Survivors::Unfiltered => SessionState::Created,
            Survivors::Selected(_) => SessionState::Applied,
            Survivors::Invalid => SessionState::Invalid,
        };
        sieve_log!(Level::Debug, "reset", "elapsed={:?}", started.elapsed());
        Ok(())
    }

    /// Returns the next surviving row, or `None` once every survivor was served.
    ///
    /// After a decoder failure this keeps returning
    /// [`FilterError::CursorFailed`] until the cursor is rewound.
    pub fn next_row(&mut self) -> Result<Option<D::Row>, FilterError> {
        if !self.cursor.is_open() && !self.cursor.has_failed() {
            self.reset()?;
        }
        let Some(target) = self.survivor_at(self.cursor.consumed())? else {
            self.state = SessionState::Exhausted;
            return Ok(None);
        };
        let row = self.cursor.seek(target, self.rows)?;
        self.state = SessionState::Reading;
        Ok(Some(row))
    }

    /// Rewinds and collects every surviving row in file order.
    pub fn read_all(&mut self) -> Result<Vec<D::Row>, FilterError> {
        let started = Instant::now();
        self.reset()?;
        let mut out = Vec::with_capacity(self.filtered_len());
        while let Some(row) = self.next_row()? {
            out.push(row);
        }
        sieve_log!(
            Level::Debug,
            "read_all",
            "rows={} refills={} elapsed={:?}",
            out.len(),
            self.cursor.refills(),
            started.elapsed()
        );
        Ok(out)
    }

    /// Rewinds and returns an iterator over the surviving rows.
    ///
    /// The iterator stops after the first error it yields.
    pub fn rows(&mut self) -> Result<Rows<'_, D>, FilterError> {
        self.reset()?;
        Ok(Rows {
            reader: self,
            done: false,
        })
    }

    /// Decodes the whole file once and picks the survivors by position.
    ///
    /// Returns the same rows as [`read_all`](Self::read_all); cheaper when
    /// most rows survive or the file is small.
    pub fn all_brute(&mut self) -> Result<Vec<D::Row>, FilterError> {
        let started = Instant::now();
        if matches!(self.survivors, Survivors::Invalid) {
            return Err(FilterError::InvalidSurvivors);
        }
        self.reset()?;
        let decoded = self
            .decoder
            .read_all_rows()
            .map_err(|source| FilterError::decode(None, 0, source))?;
        sieve_log!(
            Level::Debug,
            "all_brute_decode",
            "rows={} elapsed={:?}",
            decoded.len(),
            started.elapsed()
        );

        let selected = match &self.survivors {
            Survivors::Selected(selection) => select(decoded, selection.as_slice())?,
            _ => decoded,
        };
        sieve_log!(
            Level::Debug,
            "all_brute",
            "rows={} elapsed={:?}",
            selected.len(),
            started.elapsed()
        );
        Ok(selected)
    }

    fn survivor_at(&self, n: usize) -> Result<Option<RowId>, FilterError> {
        match &self.survivors {
            Survivors::Unfiltered => Ok((n < self.rows).then_some(n)),
            Survivors::Selected(selection) => Ok(selection.get(n)),
            Survivors::Invalid => Err(FilterError::InvalidSurvivors),
        }
    }
}

// Keeps `decoded[i]` for every `i` in the ascending `wanted`, without cloning rows.
fn select<R>(decoded: Vec<R>, wanted: &[RowId]) -> Result<Vec<R>, FilterError> {
    let available = decoded.len();
    if let Some(&last) = wanted.last() {
        if last >= available {
            return Err(FilterError::decode(
                None,
                last,
                DecodeError::OutOfRange {
                    requested: last,
                    available,
                },
            ));
        }
    }
    let mut wanted = wanted.iter().peekable();
    Ok(decoded
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            if wanted.peek() == Some(&&index) {
                wanted.next();
                Some(row)
            } else {
                None
            }
        })
        .collect())
}

/// Iterator over surviving rows, see [`FilterReader::rows`].
pub struct Rows<'a, D: Decoder> {
    reader: &'a mut FilterReader<D>,
    done: bool,
}

impl<D: Decoder> Iterator for Rows<'_, D> {
    type Item = Result<D::Row, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Int64Array, StringArray},
        datatypes::{DataType, Field, Schema},
        record_batch::RecordBatch,
    };
    use std::{cell::Cell, rc::Rc};

    use sieve_predicate::Value;

    use super::*;
    use crate::decoder::{
        record_batch::ArrowRowStream, ArrowDecoder, ArrowRow, ResolvedColumn, RowStream,
    };

    // Arrow decoder whose row streams fail the next `pending` reads.
    struct FlakyDecoder {
        inner: ArrowDecoder,
        pending: Rc<Cell<usize>>,
    }

    struct FlakyRows {
        inner: ArrowRowStream,
        pending: Rc<Cell<usize>>,
    }

    impl RowStream for FlakyRows {
        type Row = ArrowRow;

        fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
            self.inner.skip(n)
        }

        fn read_n(&mut self, n: usize) -> Result<Vec<ArrowRow>, DecodeError> {
            if self.pending.get() > 0 {
                self.pending.set(self.pending.get() - 1);
                return Err(DecodeError::Unsupported("truncated page".into()));
            }
            self.inner.read_n(n)
        }
    }

    impl Decoder for FlakyDecoder {
        type Row = ArrowRow;
        type Columns = <ArrowDecoder as Decoder>::Columns;
        type Rows = FlakyRows;

        fn row_count(&self) -> usize {
            self.inner.row_count()
        }

        fn resolve_path(&self, path: &str) -> Result<ResolvedColumn, DecodeError> {
            self.inner.resolve_path(path)
        }

        fn open_column(&self, column: &ResolvedColumn) -> Result<Self::Columns, DecodeError> {
            self.inner.open_column(column)
        }

        fn open_rows(&self) -> Result<FlakyRows, DecodeError> {
            Ok(FlakyRows {
                inner: self.inner.open_rows()?,
                pending: self.pending.clone(),
            })
        }

        fn read_all_rows(&self) -> Result<Vec<ArrowRow>, DecodeError> {
            self.inner.read_all_rows()
        }
    }

    fn decoder(values: Vec<i64>) -> ArrowDecoder {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int64, false),
            Field::new("b", DataType::Utf8, false),
        ]));
        let labels: Vec<String> = values.iter().map(|v| format!("r{v}")).collect();
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(values)),
                Arc::new(StringArray::from(labels)),
            ],
        )
        .expect("record batch");
        ArrowDecoder::from_batch(batch)
    }

    fn ids(rows: &[ArrowRow]) -> Vec<i64> {
        rows.iter()
            .map(|row| match row.get("a") {
                Some(Value::Int64(v)) => *v,
                other => panic!("unexpected value {other:?}"),
            })
            .collect()
    }

    #[test]
    fn unapplied_session_reads_every_row() {
        let mut reader = FilterReader::new(decoder(vec![5, 6, 7]));
        assert_eq!(reader.state(), SessionState::Created);
        assert_eq!(reader.filtered_len(), 3);
        assert!(reader.survivors().is_none());
        assert_eq!(ids(&reader.read_all().expect("read all")), vec![5, 6, 7]);
        assert_eq!(reader.state(), SessionState::Exhausted);
    }

    #[test]
    fn state_follows_the_cursor() {
        let mut reader = FilterReader::new(decoder(vec![1, 2, 3]));
        reader.filter_column("a", Operator::Greater, 1i64);
        reader.apply().expect("apply");
        assert_eq!(reader.state(), SessionState::Applied);
        assert!(reader.next_row().expect("row").is_some());
        assert_eq!(reader.state(), SessionState::Reading);
        assert!(reader.next_row().expect("row").is_some());
        assert!(reader.next_row().expect("end").is_none());
        assert_eq!(reader.state(), SessionState::Exhausted);
        reader.reset().expect("reset");
        assert_eq!(reader.state(), SessionState::Applied);
    }

    #[test]
    fn rows_iterator_matches_read_all() {
        let mut reader = FilterReader::with_options(
            decoder((0..40).collect()),
            ReaderOptions::default().buffer_rows(3),
        );
        reader.filter_column("a", Operator::In, vec![1i64, 2, 17, 30, 39]);
        reader.apply().expect("apply");
        let iterated = reader
            .rows()
            .expect("rows")
            .collect::<Result<Vec<_>, _>>()
            .expect("iterate");
        assert_eq!(ids(&iterated), vec![1, 2, 17, 30, 39]);
        assert_eq!(iterated, reader.read_all().expect("read all"));
        assert_eq!(iterated, reader.all_brute().expect("brute"));
    }

    #[test]
    fn select_rejects_out_of_range_survivors() {
        assert_eq!(select(vec!['a', 'b', 'c'], &[0, 2]).expect("select"), vec!['a', 'c']);
        assert!(matches!(
            select(vec!['a'], &[0, 4]),
            Err(FilterError::Decode { row: 4, .. })
        ));
    }

    #[test]
    fn decode_failure_never_yields_a_misplaced_row() {
        let pending = Rc::new(Cell::new(0));
        let mut reader = FilterReader::with_options(
            FlakyDecoder {
                inner: decoder((0..40).collect()),
                pending: pending.clone(),
            },
            ReaderOptions::default().buffer_rows(2),
        );
        reader.filter_column("a", Operator::In, vec![10i64, 11, 30]);
        reader.apply().expect("apply");

        pending.set(1);
        assert!(matches!(reader.next_row(), Err(FilterError::Decode { row: 10, .. })));
        assert!(matches!(reader.next_row(), Err(FilterError::CursorFailed)));

        reader.reset().expect("reset");
        let mut served = Vec::new();
        while let Some(row) = reader.next_row().expect("next") {
            served.push(row);
        }
        assert_eq!(ids(&served), vec![10, 11, 30]);
    }
}
