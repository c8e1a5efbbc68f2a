use std::{sync::Arc, time::Instant};

use log::Level;
use sieve_predicate::{BoundFilter, CanonicalValue, ColumnFilter, EvalError, RowSelection, RowSet};

use super::{FilterError, FilterReader, SessionState, Survivors};
use crate::{
    decoder::{ColumnStream, Decoder},
    logging::sieve_log,
};

impl<D: Decoder> FilterReader<D> {
    /// Computes the survivor set from every registered filter.
    ///
    /// Filters are grouped by column, columns are scanned in the order they
    /// were first referenced, and each scan only visits rows that survived
    /// the columns before it. On success the cursor is rewound; on failure
    /// the survivor set is undefined until the next successful apply.
    pub fn apply(&mut self) -> Result<(), FilterError> {
        let started = Instant::now();
        match self.scan() {
            Ok(selection) => {
                sieve_log!(
                    Level::Debug,
                    "apply",
                    "rows={} survivors={} elapsed={:?}",
                    self.rows,
                    selection.len(),
                    started.elapsed()
                );
                self.survivors = Survivors::Selected(selection);
                self.reset()
            }
            Err(err) => {
                sieve_log!(Level::Debug, "apply_failed", "error={}", err);
                self.survivors = Survivors::Invalid;
                self.state = SessionState::Invalid;
                Err(err)
            }
        }
    }

    fn scan(&self) -> Result<RowSelection, FilterError> {
        let started = Instant::now();
        let mut survivors = RowSelection::all(self.rows);
        sieve_log!(
            Level::Debug,
            "apply_base",
            "rows={} elapsed={:?}",
            self.rows,
            started.elapsed()
        );

        for (column, filters) in group_by_column(&self.filters)? {
            let started = Instant::now();
            let kept = self.scan_column(&column, &filters, &survivors)?;
            sieve_log!(
                Level::Debug,
                "apply_column",
                "column={} filters={} scanned={} kept={} elapsed={:?}",
                column,
                filters.len(),
                survivors.len(),
                kept.len(),
                started.elapsed()
            );

            let started = Instant::now();
            survivors = survivors.intersect(&kept);
            sieve_log!(
                Level::Debug,
                "apply_intersection",
                "column={} survivors={} elapsed={:?}",
                column,
                survivors.len(),
                started.elapsed()
            );
        }
        Ok(survivors)
    }

    // One forward pass over `column`, visiting only the current survivors.
    fn scan_column(
        &self,
        column: &Arc<str>,
        filters: &[&ColumnFilter],
        survivors: &RowSelection,
    ) -> Result<RowSelection, FilterError> {
        let resolved = self
            .decoder
            .resolve_path(column)
            .map_err(|source| FilterError::decode(Some(column), 0, source))?;
        let mut stream = self
            .decoder
            .open_column(&resolved)
            .map_err(|source| FilterError::decode(Some(column), 0, source))?;

        let mut position = 0;
        let mut kept = Vec::new();
        for &row in survivors.as_slice() {
            if row > position {
                stream
                    .skip(row - position)
                    .map_err(|source| FilterError::decode(Some(column), position, source))?;
                position = row;
            }
            let value = stream
                .read_one()
                .map_err(|source| FilterError::decode(Some(column), row, source))?;
            position += 1;

            let value = if resolved.repeated {
                value.into_list()
            } else {
                value
            };
            if all_match(filters, &value.canonicalize())? {
                kept.push(row);
            }
        }
        Ok(RowSelection::from_sorted(kept))
    }
}

// AND over the filters of one column, stopping at the first miss.
fn all_match(filters: &[&ColumnFilter], value: &CanonicalValue) -> Result<bool, EvalError> {
    for filter in filters {
        if !filter.matches(value)? {
            return Ok(false);
        }
    }
    Ok(true)
}

// Groups column filters by path, keeping first-reference order; constants are dropped.
fn group_by_column(
    filters: &[BoundFilter],
) -> Result<Vec<(Arc<str>, Vec<&ColumnFilter>)>, FilterError> {
    let mut groups: Vec<(Arc<str>, Vec<&ColumnFilter>)> = Vec::new();
    for filter in filters {
        match filter {
            BoundFilter::Column(filter) => {
                match groups.iter_mut().find(|(column, _)| *column == filter.column) {
                    Some((_, group)) => group.push(filter),
                    None => groups.push((filter.column.clone(), vec![filter])),
                }
            }
            BoundFilter::ColumnPair { left, right } => {
                return Err(FilterError::ColumnComparison {
                    left: left.clone(),
                    right: right.clone(),
                })
            }
            BoundFilter::Constant => {}
        }
    }
    Ok(groups)
}
