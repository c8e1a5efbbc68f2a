//! Survivor index sets kept as ascending, duplicate-free vectors.

/// Ordinal position of a row in the decoded file.
pub type RowId = usize;

/// Borrowed iterator that yields [`RowId`] values.
pub type RowIdIter<'a> = Box<dyn Iterator<Item = RowId> + Send + 'a>;

/// Abstract set of row identifiers that supports intersection.
pub trait RowSet: Send + Sync {
    /// Returns the number of rows tracked by the set.
    fn len(&self) -> usize;

    /// Returns true when the set is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over row identifiers in ascending order.
    fn iter(&self) -> RowIdIter<'_>;

    /// Returns the intersection between this set and `other`.
    fn intersect(&self, other: &Self) -> Self
    where
        Self: Sized;
}

/// Ascending, duplicate-free list of surviving row identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowSelection {
    rows: Vec<RowId>,
}

impl RowSelection {
    /// Creates an empty selection.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Selects every row in `[0, row_count)`.
    #[must_use]
    pub fn all(row_count: usize) -> Self {
        Self {
            rows: (0..row_count).collect(),
        }
    }

    /// Wraps a vector that is already ascending and duplicate-free.
    #[must_use]
    pub fn from_sorted(rows: Vec<RowId>) -> Self {
        debug_assert!(
            rows.windows(2).all(|pair| pair[0] < pair[1]),
            "row selection must be strictly ascending"
        );
        Self { rows }
    }

    /// Returns the row at position `n` of the selection.
    #[must_use]
    pub fn get(&self, n: usize) -> Option<RowId> {
        self.rows.get(n).copied()
    }

    /// Returns true when `row` is selected.
    #[must_use]
    pub fn contains(&self, row: RowId) -> bool {
        self.rows.binary_search(&row).is_ok()
    }

    /// Borrows the selected rows.
    #[must_use]
    pub fn as_slice(&self) -> &[RowId] {
        &self.rows
    }

    /// Consumes the selection and returns the rows.
    #[must_use]
    pub fn into_vec(self) -> Vec<RowId> {
        self.rows
    }
}

impl RowSet for RowSelection {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn iter(&self) -> RowIdIter<'_> {
        Box::new(self.rows.iter().copied())
    }

    fn intersect(&self, other: &Self) -> Self {
        Self {
            rows: intersection(&self.rows, &other.rows),
        }
    }
}

impl FromIterator<RowId> for RowSelection {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        let mut rows: Vec<RowId> = iter.into_iter().collect();
        rows.sort_unstable();
        rows.dedup();
        Self { rows }
    }
}

/// Intersects two ascending, duplicate-free sequences with a two-pointer merge.
#[must_use]
pub fn intersection(left: &[RowId], right: &[RowId]) -> Vec<RowId> {
    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(left[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_of_uneven_inputs() {
        assert_eq!(intersection(&[1, 2, 3, 4], &[0, 2, 4, 5, 6]), vec![2, 4]);
        assert_eq!(
            intersection(
                &[1, 2, 3, 4, 123, 234, 544, 665, 756, 876, 964],
                &[0, 2, 4, 5, 6, 665]
            ),
            vec![2, 4, 665]
        );
        assert!(intersection(&[], &[1, 2]).is_empty());
        assert!(intersection(&[7, 8], &[1, 2]).is_empty());
    }

    #[test]
    fn selection_algebra() {
        let all = RowSelection::all(6);
        let evens: RowSelection = [4, 0, 2, 2].into_iter().collect();
        assert_eq!(evens.as_slice(), &[0, 2, 4]);
        assert_eq!(all.intersect(&evens), evens);
        assert_eq!(evens.intersect(&all), evens);
        assert!(evens.contains(2));
        assert!(!evens.contains(3));
        assert_eq!(evens.get(1), Some(2));
        assert_eq!(evens.iter().collect::<Vec<_>>(), vec![0, 2, 4]);
        assert!(RowSelection::empty().intersect(&all).is_empty());
    }
}
