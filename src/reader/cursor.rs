use std::collections::VecDeque;

use super::FilterError;
use crate::decoder::{DecodeError, RowStream};

/// Buffered, forward-only cursor over a row stream.
///
/// Rows are decoded in windows of up to `capacity` rows. A survivor that
/// falls inside the current window is served from memory; otherwise the
/// stream skips to it and a new window starts there. A failed skip or refill
/// closes the cursor, since the stream position is then unknown; it stays
/// closed until the next rewind.
pub(crate) struct RowCursor<S: RowStream> {
    stream: Option<S>,
    // Physical row at the front of `window`; equals the stream position when the window is empty.
    position: usize,
    window: VecDeque<S::Row>,
    consumed: usize,
    capacity: usize,
    refills: usize,
    failed: bool,
}

impl<S: RowStream> RowCursor<S> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            stream: None,
            position: 0,
            window: VecDeque::new(),
            consumed: 0,
            capacity: capacity.max(1),
            refills: 0,
            failed: false,
        }
    }

    pub(crate) fn rewind(&mut self, stream: S) {
        self.stream = Some(stream);
        self.position = 0;
        self.window.clear();
        self.consumed = 0;
        self.refills = 0;
        self.failed = false;
    }

    pub(crate) fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// True once a decoder failure closed the cursor.
    pub(crate) fn has_failed(&self) -> bool {
        self.failed
    }

    fn fail(&mut self) {
        self.stream = None;
        self.window.clear();
        self.failed = true;
    }

    /// Survivors served since the last rewind.
    pub(crate) fn consumed(&self) -> usize {
        self.consumed
    }

    pub(crate) fn refills(&self) -> usize {
        self.refills
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns physical row `target`; targets must be requested in ascending order.
    pub(crate) fn seek(&mut self, target: usize, row_count: usize) -> Result<S::Row, FilterError> {
        if self.failed {
            return Err(FilterError::CursorFailed);
        }
        debug_assert!(target >= self.position, "cursor only moves forward");
        let gap = target - self.position;
        if gap < self.window.len() {
            self.window.drain(..gap);
        } else {
            let skip = gap - self.window.len();
            self.window.clear();
            let stream = match self.stream.as_mut() {
                Some(stream) => stream,
                None => {
                    return Err(FilterError::decode(
                        None,
                        target,
                        DecodeError::Unsupported("row stream is not open".into()),
                    ))
                }
            };
            let want = self.capacity.min(row_count.saturating_sub(target)).max(1);
            let refill = stream.skip(skip).and_then(|()| stream.read_n(want));
            match refill {
                Ok(rows) => self.window = rows.into(),
                Err(source) => {
                    self.fail();
                    return Err(FilterError::decode(None, target, source));
                }
            }
            self.refills += 1;
        }
        let Some(row) = self.window.pop_front() else {
            self.fail();
            return Err(FilterError::decode(
                None,
                target,
                DecodeError::OutOfRange {
                    requested: target,
                    available: row_count,
                },
            ));
        };
        self.position = target + 1;
        self.consumed += 1;
        Ok(row)
    }
}
