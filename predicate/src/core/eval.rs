//! Operator semantics over canonical values.

use std::{cmp::Ordering, collections::HashSet};

use super::{value::HashKey, CanonicalValue, Operator, OperatorError};

/// Sequence length above which overlap switches from a nested loop to a hash set.
pub const OVERLAP_HASH_THRESHOLD: usize = 50;

impl Operator {
    /// Applies the operator to two canonical operands.
    ///
    /// Equality is defined for every kind. Ordering comparisons require both
    /// sides to share a kind among integer, float and string; comparisons
    /// involving NaN are false.
    pub fn evaluate(
        self,
        left: &CanonicalValue,
        right: &CanonicalValue,
    ) -> Result<bool, OperatorError> {
        match self {
            Operator::Equal => Ok(left == right),
            Operator::NotEqual => Ok(left != right),
            Operator::Less | Operator::LessEqual | Operator::Greater | Operator::GreaterEqual => {
                let ordering = compare(self, left, right)?;
                Ok(ordering.is_some_and(|ordering| self.accepts(ordering)))
            }
            Operator::Overlap => {
                let left = sequence(self, left)?;
                let right = sequence(self, right)?;
                Ok(overlaps(left, right))
            }
            Operator::In => {
                let candidates = sequence(self, right)?;
                match left {
                    CanonicalValue::Sequence(values) => Ok(overlaps(values, candidates)),
                    scalar if scalar.is_scalar() => {
                        Ok(candidates.iter().any(|candidate| candidate == scalar))
                    }
                    other => Err(OperatorError::NotAScalar {
                        op: self,
                        kind: other.kind(),
                    }),
                }
            }
            Operator::Like => match (left, right) {
                (CanonicalValue::String(value), CanonicalValue::String(pattern)) => {
                    like(value, pattern)
                }
                _ => Err(mismatch(self, left, right)),
            },
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Operator::Less => ordering == Ordering::Less,
            Operator::LessEqual => ordering != Ordering::Greater,
            Operator::Greater => ordering == Ordering::Greater,
            Operator::GreaterEqual => ordering != Ordering::Less,
            _ => false,
        }
    }
}

fn compare(
    op: Operator,
    left: &CanonicalValue,
    right: &CanonicalValue,
) -> Result<Option<Ordering>, OperatorError> {
    use CanonicalValue::*;
    match (left, right) {
        (Integer64(lhs), Integer64(rhs)) => Ok(Some(lhs.cmp(rhs))),
        (Float64(lhs), Float64(rhs)) => Ok(lhs.partial_cmp(rhs)),
        (String(lhs), String(rhs)) => Ok(Some(lhs.cmp(rhs))),
        _ => Err(mismatch(op, left, right)),
    }
}

fn mismatch(op: Operator, left: &CanonicalValue, right: &CanonicalValue) -> OperatorError {
    OperatorError::TypeMismatch {
        op,
        left: left.kind(),
        right: right.kind(),
    }
}

fn sequence(op: Operator, value: &CanonicalValue) -> Result<&[CanonicalValue], OperatorError> {
    value.as_sequence().ok_or(OperatorError::NotASequence {
        op,
        kind: value.kind(),
    })
}

/// Returns true when the two sequences share at least one element.
///
/// Picks [`overlap_hashed`] once either side exceeds
/// [`OVERLAP_HASH_THRESHOLD`] elements, [`overlap_nested_loop`] otherwise.
#[must_use]
pub fn overlaps(left: &[CanonicalValue], right: &[CanonicalValue]) -> bool {
    if left.len() > OVERLAP_HASH_THRESHOLD || right.len() > OVERLAP_HASH_THRESHOLD {
        overlap_hashed(left, right)
    } else {
        overlap_nested_loop(left, right)
    }
}

/// O(n·m) overlap check.
#[must_use]
pub fn overlap_nested_loop(left: &[CanonicalValue], right: &[CanonicalValue]) -> bool {
    right
        .iter()
        .any(|candidate| left.iter().any(|value| value == candidate))
}

/// O(n+m) overlap check: hashes the larger side and probes with the smaller.
#[must_use]
pub fn overlap_hashed(left: &[CanonicalValue], right: &[CanonicalValue]) -> bool {
    let (build, probe) = if left.len() >= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    let set: HashSet<HashKey<'_>> = build.iter().map(HashKey).collect();
    probe.iter().any(|value| set.contains(&HashKey(value)))
}

fn like(value: &str, pattern: &str) -> Result<bool, OperatorError> {
    if pattern.matches('%').count() == 1 {
        if let Some(suffix) = pattern.strip_prefix('%') {
            return Ok(value.ends_with(suffix));
        }
        if let Some(prefix) = pattern.strip_suffix('%') {
            return Ok(value.starts_with(prefix));
        }
    }
    Err(OperatorError::UnsupportedPattern {
        pattern: pattern.to_owned(),
    })
}
