/// Default upper bound on the read-ahead window, in rows.
pub const DEFAULT_MAX_BUFFER_ROWS: usize = 20_000;

/// Default fraction of a row group buffered per refill (one tenth).
pub const DEFAULT_ROW_GROUP_DIVISOR: usize = 10;

/// How many rows the materializing cursor decodes per refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSize {
    /// Always buffer this many rows.
    Fixed(usize),
    /// Buffer `row_group_rows / divisor` rows, clamped to `[1, max]`.
    ///
    /// Falls back to `max` when the decoder reports no row group size.
    RowGroupFraction {
        /// Divisor applied to the first row group's size.
        divisor: usize,
        /// Upper bound on the window.
        max: usize,
    },
}

impl Default for BufferSize {
    fn default() -> Self {
        BufferSize::RowGroupFraction {
            divisor: DEFAULT_ROW_GROUP_DIVISOR,
            max: DEFAULT_MAX_BUFFER_ROWS,
        }
    }
}

impl BufferSize {
    /// Resolves the window size in rows; never zero.
    pub fn resolve(self, row_group_rows: Option<usize>) -> usize {
        let rows = match self {
            BufferSize::Fixed(rows) => rows,
            BufferSize::RowGroupFraction { divisor, max } => match row_group_rows {
                Some(group) => (group / divisor.max(1)).min(max),
                None => max,
            },
        };
        rows.max(1)
    }
}

/// Options for a [`FilterReader`](crate::FilterReader) session.
#[derive(Debug, Clone, Default)]
pub struct ReaderOptions {
    pub(crate) buffer_size: BufferSize,
}

impl ReaderOptions {
    /// Sets the read-ahead window policy.
    pub fn buffer_size(self, buffer_size: BufferSize) -> Self {
        ReaderOptions { buffer_size }
    }

    /// Shorthand for `buffer_size(BufferSize::Fixed(rows))`.
    pub fn buffer_rows(self, rows: usize) -> Self {
        self.buffer_size(BufferSize::Fixed(rows))
    }

    pub(crate) fn buffer_capacity(&self, row_group_rows: Option<usize>) -> usize {
        self.buffer_size.resolve(row_group_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_takes_a_tenth_of_the_row_group() {
        let options = ReaderOptions::default();
        assert_eq!(options.buffer_capacity(Some(1_000)), 100);
        assert_eq!(options.buffer_capacity(Some(1_000_000)), DEFAULT_MAX_BUFFER_ROWS);
        assert_eq!(options.buffer_capacity(Some(3)), 1);
        assert_eq!(options.buffer_capacity(None), DEFAULT_MAX_BUFFER_ROWS);
    }

    #[test]
    fn fixed_size_is_never_zero() {
        assert_eq!(ReaderOptions::default().buffer_rows(0).buffer_capacity(None), 1);
        assert_eq!(
            ReaderOptions::default()
                .buffer_rows(64)
                .buffer_capacity(Some(10)),
            64
        );
    }

    #[test]
    fn fraction_honours_custom_bounds() {
        let options = ReaderOptions::default().buffer_size(BufferSize::RowGroupFraction {
            divisor: 2,
            max: 8,
        });
        assert_eq!(options.buffer_capacity(Some(10)), 5);
        assert_eq!(options.buffer_capacity(Some(100)), 8);
    }
}
