use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Value as produced by a decoder, before canonicalization.
///
/// Decoders keep the physical width and signedness of the stored column; the
/// evaluator never looks at this type directly and always works on
/// [`CanonicalValue`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// Boolean cell.
    Boolean(bool),
    /// Signed 8-bit integer.
    Int8(i8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 8-bit integer.
    UInt8(u8),
    /// Unsigned 16-bit integer.
    UInt16(u16),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// 32-bit floating point.
    Float32(f32),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
    /// Binary blob.
    Binary(Vec<u8>),
    /// All values of a repeated column for one row.
    List(Vec<Value>),
    /// Display form of a logical type the engine does not interpret.
    Other(String),
}

impl Value {
    /// Canonicalizes this value, see [`canonicalize`].
    #[must_use]
    pub fn canonicalize(self) -> CanonicalValue {
        canonicalize(self)
    }

    /// Wraps the value as the per-row list of a repeated column.
    ///
    /// Lists pass through, `Null` becomes the empty list and any other scalar
    /// becomes a single-element list.
    #[must_use]
    pub fn into_list(self) -> Value {
        match self {
            Value::List(values) => Value::List(values),
            Value::Null => Value::List(Vec::new()),
            scalar => Value::List(vec![scalar]),
        }
    }
}

/// Normalizes a decoded value into its canonical form.
///
/// Every integer width collapses to `Integer64` (unsigned 64-bit values above
/// `i64::MAX` wrap, as a two's complement cast does), every float width to
/// `Float64`; lists are canonicalized element by element.
#[must_use]
pub fn canonicalize(value: Value) -> CanonicalValue {
    match value {
        Value::Int8(v) => CanonicalValue::Integer64(i64::from(v)),
        Value::Int16(v) => CanonicalValue::Integer64(i64::from(v)),
        Value::Int32(v) => CanonicalValue::Integer64(i64::from(v)),
        Value::Int64(v) => CanonicalValue::Integer64(v),
        Value::UInt8(v) => CanonicalValue::Integer64(i64::from(v)),
        Value::UInt16(v) => CanonicalValue::Integer64(i64::from(v)),
        Value::UInt32(v) => CanonicalValue::Integer64(i64::from(v)),
        Value::UInt64(v) => CanonicalValue::Integer64(v as i64),
        Value::Float32(v) => CanonicalValue::Float64(f64::from(v)),
        Value::Float64(v) => CanonicalValue::Float64(v),
        Value::Utf8(v) => CanonicalValue::String(v),
        Value::List(values) => {
            CanonicalValue::Sequence(values.into_iter().map(canonicalize).collect())
        }
        Value::Null => CanonicalValue::Opaque(Opaque::Null),
        Value::Boolean(v) => CanonicalValue::Opaque(Opaque::Boolean(v)),
        Value::Binary(v) => CanonicalValue::Opaque(Opaque::Binary(v)),
        Value::Other(v) => CanonicalValue::Opaque(Opaque::Other(v)),
    }
}

impl From<Value> for CanonicalValue {
    fn from(value: Value) -> Self {
        canonicalize(value)
    }
}

/// Canonical representation every comparison operates on.
#[derive(Clone, Debug, PartialEq)]
pub enum CanonicalValue {
    /// Any integer width or signedness.
    Integer64(i64),
    /// Any float width.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of canonical values.
    Sequence(Vec<CanonicalValue>),
    /// Values the comparison operators treat as uninterpreted.
    Opaque(Opaque),
}

/// Uninterpreted payload of [`CanonicalValue::Opaque`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Opaque {
    /// Missing value.
    Null,
    /// Boolean cell.
    Boolean(bool),
    /// Binary blob.
    Binary(Vec<u8>),
    /// Display form of an uninterpreted logical type.
    Other(String),
}

impl CanonicalValue {
    /// Returns the canonical tag of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            CanonicalValue::Integer64(_) => ValueKind::Integer64,
            CanonicalValue::Float64(_) => ValueKind::Float64,
            CanonicalValue::String(_) => ValueKind::String,
            CanonicalValue::Sequence(_) => ValueKind::Sequence,
            CanonicalValue::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Returns the elements when this value is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[CanonicalValue]> {
        match self {
            CanonicalValue::Sequence(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the string slice when this value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CanonicalValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true for `Integer64`, `Float64` and `String`.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            CanonicalValue::Integer64(_) | CanonicalValue::Float64(_) | CanonicalValue::String(_)
        )
    }
}

/// Hashing view used by the set-based overlap strategy.
///
/// Floats hash with `-0.0` folded into `0.0` so that values equal under IEEE
/// comparison land in the same bucket. NaN still never compares equal.
#[derive(Clone, Copy, Debug)]
pub(crate) struct HashKey<'a>(pub(crate) &'a CanonicalValue);

impl PartialEq for HashKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for HashKey<'_> {}

impl Hash for HashKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_canonical(self.0, state);
    }
}

fn hash_canonical<H: Hasher>(value: &CanonicalValue, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        CanonicalValue::Integer64(v) => v.hash(state),
        CanonicalValue::Float64(v) => {
            let folded = if *v == 0.0 { 0.0f64 } else { *v };
            folded.to_bits().hash(state);
        }
        CanonicalValue::String(v) => v.hash(state),
        CanonicalValue::Sequence(values) => {
            values.len().hash(state);
            for value in values {
                hash_canonical(value, state);
            }
        }
        CanonicalValue::Opaque(v) => v.hash(state),
    }
}

/// Canonical tag of a value, used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Integer of any width.
    Integer64,
    /// Float of any width.
    Float64,
    /// UTF-8 string.
    String,
    /// Sequence of values.
    Sequence,
    /// Uninterpreted value.
    Opaque,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Integer64 => "int64",
            ValueKind::Float64 => "float64",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Opaque => "opaque",
        })
    }
}

macro_rules! canonical_from {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for CanonicalValue {
                fn from(value: $source) -> Self {
                    CanonicalValue::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

canonical_from!(Integer64, i64, i8, i16, i32, i64, u8, u16, u32);
canonical_from!(Float64, f64, f32, f64);

impl From<u64> for CanonicalValue {
    fn from(value: u64) -> Self {
        canonicalize(Value::UInt64(value))
    }
}

impl From<bool> for CanonicalValue {
    fn from(value: bool) -> Self {
        CanonicalValue::Opaque(Opaque::Boolean(value))
    }
}

impl From<String> for CanonicalValue {
    fn from(value: String) -> Self {
        CanonicalValue::String(value)
    }
}

impl From<&str> for CanonicalValue {
    fn from(value: &str) -> Self {
        CanonicalValue::String(value.to_owned())
    }
}

impl<T> From<Vec<T>> for CanonicalValue
where
    T: Into<CanonicalValue>,
{
    fn from(values: Vec<T>) -> Self {
        CanonicalValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn integer_widths_collapse() {
        assert_eq!(
            Value::Int32(7).canonicalize(),
            Value::Int64(7).canonicalize()
        );
        assert_eq!(
            Value::UInt8(200).canonicalize(),
            CanonicalValue::Integer64(200)
        );
        assert_eq!(
            Value::Int16(-3).canonicalize(),
            CanonicalValue::Integer64(-3)
        );
        assert_eq!(CanonicalValue::from(7i32), CanonicalValue::from(7i64));
    }

    #[test]
    fn unsigned_overflow_wraps() {
        assert_eq!(
            Value::UInt64(u64::MAX).canonicalize(),
            CanonicalValue::Integer64(-1)
        );
    }

    #[test]
    fn float_widths_collapse() {
        assert_eq!(
            Value::Float32(1.5).canonicalize(),
            CanonicalValue::Float64(1.5)
        );
        assert_eq!(CanonicalValue::from(1.5f32), CanonicalValue::from(1.5f64));
    }

    #[test]
    fn lists_canonicalize_elementwise() {
        let list = Value::List(vec![Value::Int8(1), Value::UInt32(2), Value::Float32(0.5)]);
        assert_eq!(
            list.canonicalize(),
            CanonicalValue::Sequence(vec![
                CanonicalValue::Integer64(1),
                CanonicalValue::Integer64(2),
                CanonicalValue::Float64(0.5),
            ])
        );
    }

    #[test]
    fn into_list_wraps_scalars() {
        assert_eq!(Value::Null.into_list(), Value::List(Vec::new()));
        assert_eq!(
            Value::Int32(4).into_list(),
            Value::List(vec![Value::Int32(4)])
        );
        let list = Value::List(vec![Value::Utf8("a".into())]);
        assert_eq!(list.clone().into_list(), list);
    }

    #[test]
    fn passthrough_kinds() {
        assert_eq!(Value::Utf8("x".into()).canonicalize().kind(), ValueKind::String);
        assert_eq!(Value::Boolean(true).canonicalize().kind(), ValueKind::Opaque);
        assert_eq!(Value::Null.canonicalize().kind(), ValueKind::Opaque);
        assert_eq!(ValueKind::Sequence.to_string(), "sequence");
    }

    #[test]
    fn hash_key_folds_negative_zero() {
        let pos = CanonicalValue::Float64(0.0);
        let neg = CanonicalValue::Float64(-0.0);
        let mut set = HashSet::new();
        set.insert(HashKey(&pos));
        assert!(set.contains(&HashKey(&neg)));

        let nan = CanonicalValue::Float64(f64::NAN);
        set.insert(HashKey(&nan));
        assert!(!set.contains(&HashKey(&nan)));
    }
}
