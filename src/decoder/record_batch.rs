//! Decoder over in-memory Arrow record batches.
//!
//! Each batch plays the role of a row group. Column paths are field names,
//! dotted into struct children (`address.city`); list fields are repeated.
//! The cell conversion here is shared with the parquet decoder, which reads
//! the file as record batches too.

use std::sync::Arc;

use arrow::{
    array::{Array, AsArray, DictionaryArray},
    datatypes::{
        ArrowDictionaryKeyType, DataType, Date32Type, Date64Type, FieldRef, Float16Type,
        Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, Schema, SchemaRef,
        TimeUnit, TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
        TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
    },
    record_batch::RecordBatch,
    util::display::array_value_to_string,
};
use sieve_predicate::Value;

use super::{ColumnStream, DecodeError, Decoder, ResolvedColumn, RowStream};

/// [`Decoder`] over a sequence of record batches sharing one schema.
#[derive(Clone, Debug)]
pub struct ArrowDecoder {
    schema: SchemaRef,
    batches: Arc<[RecordBatch]>,
    // First global row of each batch.
    starts: Arc<[usize]>,
    rows: usize,
}

impl ArrowDecoder {
    /// Builds a decoder; every batch must carry `schema`.
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self, DecodeError> {
        let batches: Vec<RecordBatch> = batches
            .into_iter()
            .filter(|batch| batch.num_rows() > 0)
            .collect();
        if let Some(batch) = batches.iter().find(|batch| batch.schema() != schema) {
            return Err(DecodeError::Unsupported(format!(
                "batch schema {:?} differs from decoder schema {:?}",
                batch.schema(),
                schema
            )));
        }
        let mut starts = Vec::with_capacity(batches.len());
        let mut rows = 0;
        for batch in &batches {
            starts.push(rows);
            rows += batch.num_rows();
        }
        Ok(Self {
            schema,
            batches: batches.into(),
            starts: starts.into(),
            rows,
        })
    }

    /// Builds a decoder over a single batch.
    pub fn from_batch(batch: RecordBatch) -> Self {
        let schema = batch.schema();
        let rows = batch.num_rows();
        Self {
            schema,
            batches: vec![batch].into(),
            starts: vec![0].into(),
            rows,
        }
    }

    /// Schema shared by all batches.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn locate(&self, row: usize) -> Result<(&RecordBatch, usize), DecodeError> {
        if row >= self.rows {
            return Err(DecodeError::OutOfRange {
                requested: row,
                available: self.rows,
            });
        }
        let batch = self.starts.partition_point(|start| *start <= row) - 1;
        Ok((&self.batches[batch], row - self.starts[batch]))
    }

    fn advance(&self, position: usize, n: usize) -> Result<usize, DecodeError> {
        let target = position + n;
        if target > self.rows {
            return Err(DecodeError::OutOfRange {
                requested: target,
                available: self.rows,
            });
        }
        Ok(target)
    }
}

impl Decoder for ArrowDecoder {
    type Row = ArrowRow;
    type Columns = ArrowColumnStream;
    type Rows = ArrowRowStream;

    fn row_count(&self) -> usize {
        self.rows
    }

    fn resolve_path(&self, path: &str) -> Result<ResolvedColumn, DecodeError> {
        let (_, field) = lookup_field(&self.schema, path)?;
        Ok(ResolvedColumn {
            path: path.into(),
            internal: path.to_owned(),
            repeated: is_repeated(&field),
        })
    }

    fn open_column(&self, column: &ResolvedColumn) -> Result<Self::Columns, DecodeError> {
        let (index, _) = lookup_field(&self.schema, &column.internal)?;
        Ok(ArrowColumnStream {
            column: index,
            nested: nested_segments(&column.internal),
            decoder: self.clone(),
            position: 0,
        })
    }

    fn open_rows(&self) -> Result<Self::Rows, DecodeError> {
        Ok(ArrowRowStream {
            decoder: self.clone(),
            position: 0,
        })
    }

    fn read_all_rows(&self) -> Result<Vec<Self::Row>, DecodeError> {
        self.open_rows()?.read_n(self.rows)
    }

    fn row_group_rows(&self) -> Option<usize> {
        self.batches.first().map(RecordBatch::num_rows)
    }
}

/// Resolves a dotted path through struct fields.
///
/// Returns the index of the top-level field and the field the path ends at.
pub(crate) fn lookup_field(schema: &Schema, path: &str) -> Result<(usize, FieldRef), DecodeError> {
    let unknown = || DecodeError::UnknownColumn(path.to_owned());
    let mut segments = path.split('.');
    let first = segments.next().ok_or_else(unknown)?;
    let index = schema.index_of(first).map_err(|_| unknown())?;
    let mut field = schema.fields()[index].clone();
    for segment in segments {
        field = match field.data_type() {
            DataType::Struct(children) => children.find(segment).ok_or_else(unknown)?.1.clone(),
            _ => return Err(unknown()),
        };
    }
    Ok((index, field))
}

pub(crate) fn is_repeated(field: &FieldRef) -> bool {
    matches!(
        field.data_type(),
        DataType::List(_) | DataType::LargeList(_) | DataType::FixedSizeList(..)
    )
}

// Struct children below the top-level field of a dotted path.
pub(crate) fn nested_segments(path: &str) -> Vec<String> {
    path.split('.').skip(1).map(str::to_owned).collect()
}

/// One decoded row of an [`ArrowDecoder`] or a
/// [`ParquetDecoder`](super::ParquetDecoder).
#[derive(Clone, Debug, PartialEq)]
pub struct ArrowRow {
    schema: SchemaRef,
    values: Vec<Value>,
}

impl ArrowRow {
    /// Value of the named column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.schema.index_of(name).ok()?;
        self.values.get(index)
    }

    /// Values in schema order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Schema the row was decoded with.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }
}

/// Column stream of an [`ArrowDecoder`].
#[derive(Debug)]
pub struct ArrowColumnStream {
    decoder: ArrowDecoder,
    column: usize,
    nested: Vec<String>,
    position: usize,
}

impl ColumnStream for ArrowColumnStream {
    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.position = self.decoder.advance(self.position, n)?;
        Ok(())
    }

    fn read_one(&mut self) -> Result<Value, DecodeError> {
        let (batch, offset) = self.decoder.locate(self.position)?;
        let value = nested_cell(batch.column(self.column).as_ref(), &self.nested, offset)?;
        self.position += 1;
        Ok(value)
    }
}

/// Row stream of an [`ArrowDecoder`].
#[derive(Debug)]
pub struct ArrowRowStream {
    decoder: ArrowDecoder,
    position: usize,
}

impl RowStream for ArrowRowStream {
    type Row = ArrowRow;

    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.position = self.decoder.advance(self.position, n)?;
        Ok(())
    }

    fn read_n(&mut self, n: usize) -> Result<Vec<ArrowRow>, DecodeError> {
        let end = self.decoder.rows.min(self.position + n);
        let mut rows = Vec::with_capacity(end - self.position);
        for row in self.position..end {
            let (batch, offset) = self.decoder.locate(row)?;
            rows.push(decode_row(batch, offset)?);
        }
        self.position = end;
        Ok(rows)
    }
}

pub(crate) fn decode_row(batch: &RecordBatch, row: usize) -> Result<ArrowRow, DecodeError> {
    let values = batch
        .columns()
        .iter()
        .map(|column| cell(column.as_ref(), row))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ArrowRow {
        schema: batch.schema(),
        values,
    })
}

// Reads `row` of the struct child that `nested` names under `column`.
pub(crate) fn nested_cell(
    column: &dyn Array,
    nested: &[String],
    row: usize,
) -> Result<Value, DecodeError> {
    let mut array = column;
    for name in nested {
        if array.is_null(row) {
            return Ok(Value::Null);
        }
        let parent = array.as_struct_opt().ok_or_else(|| {
            DecodeError::Unsupported(format!("'{name}' is read from a non-struct column"))
        })?;
        array = parent
            .column_by_name(name)
            .ok_or_else(|| DecodeError::UnknownColumn(nested.join(".")))?
            .as_ref();
    }
    cell(array, row)
}

fn cell(array: &dyn Array, row: usize) -> Result<Value, DecodeError> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        DataType::Boolean => Value::Boolean(array.as_boolean().value(row)),
        DataType::Int8 => Value::Int8(array.as_primitive::<Int8Type>().value(row)),
        DataType::Int16 => Value::Int16(array.as_primitive::<Int16Type>().value(row)),
        DataType::Int32 => Value::Int32(array.as_primitive::<Int32Type>().value(row)),
        DataType::Int64 => Value::Int64(array.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::UInt8(array.as_primitive::<UInt8Type>().value(row)),
        DataType::UInt16 => Value::UInt16(array.as_primitive::<UInt16Type>().value(row)),
        DataType::UInt32 => Value::UInt32(array.as_primitive::<UInt32Type>().value(row)),
        DataType::UInt64 => Value::UInt64(array.as_primitive::<UInt64Type>().value(row)),
        DataType::Float16 => {
            Value::Float32(array.as_primitive::<Float16Type>().value(row).to_f32())
        }
        DataType::Float32 => Value::Float32(array.as_primitive::<Float32Type>().value(row)),
        DataType::Float64 => Value::Float64(array.as_primitive::<Float64Type>().value(row)),
        DataType::Date32 => Value::Int32(array.as_primitive::<Date32Type>().value(row)),
        DataType::Date64 => Value::Int64(array.as_primitive::<Date64Type>().value(row)),
        DataType::Timestamp(unit, _) => Value::Int64(match unit {
            TimeUnit::Second => array.as_primitive::<TimestampSecondType>().value(row),
            TimeUnit::Millisecond => array.as_primitive::<TimestampMillisecondType>().value(row),
            TimeUnit::Microsecond => array.as_primitive::<TimestampMicrosecondType>().value(row),
            TimeUnit::Nanosecond => array.as_primitive::<TimestampNanosecondType>().value(row),
        }),
        DataType::Utf8 => Value::Utf8(array.as_string::<i32>().value(row).to_owned()),
        DataType::LargeUtf8 => Value::Utf8(array.as_string::<i64>().value(row).to_owned()),
        DataType::Binary => Value::Binary(array.as_binary::<i32>().value(row).to_vec()),
        DataType::LargeBinary => Value::Binary(array.as_binary::<i64>().value(row).to_vec()),
        DataType::List(_) => list(array.as_list::<i32>().value(row).as_ref())?,
        DataType::LargeList(_) => list(array.as_list::<i64>().value(row).as_ref())?,
        DataType::FixedSizeList(..) => list(array.as_fixed_size_list().value(row).as_ref())?,
        DataType::Dictionary(key, _) => match key.as_ref() {
            DataType::Int8 => dictionary(array.as_dictionary::<Int8Type>(), row)?,
            DataType::Int16 => dictionary(array.as_dictionary::<Int16Type>(), row)?,
            DataType::Int32 => dictionary(array.as_dictionary::<Int32Type>(), row)?,
            DataType::Int64 => dictionary(array.as_dictionary::<Int64Type>(), row)?,
            DataType::UInt8 => dictionary(array.as_dictionary::<UInt8Type>(), row)?,
            DataType::UInt16 => dictionary(array.as_dictionary::<UInt16Type>(), row)?,
            DataType::UInt32 => dictionary(array.as_dictionary::<UInt32Type>(), row)?,
            DataType::UInt64 => dictionary(array.as_dictionary::<UInt64Type>(), row)?,
            other => {
                return Err(DecodeError::Unsupported(format!(
                    "dictionary key type {other}"
                )))
            }
        },
        _ => Value::Other(array_value_to_string(array, row)?),
    };
    Ok(value)
}

// Dictionary cells decode as the value they point at.
fn dictionary<K: ArrowDictionaryKeyType>(
    array: &DictionaryArray<K>,
    row: usize,
) -> Result<Value, DecodeError> {
    match array.key(row) {
        Some(key) => cell(array.values().as_ref(), key),
        None => Ok(Value::Null),
    }
}

fn list(values: &dyn Array) -> Result<Value, DecodeError> {
    (0..values.len())
        .map(|index| cell(values, index))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{
            ArrayRef, DictionaryArray, Float32Array, Int32Array, ListArray, StringArray,
            StructArray,
        },
        compute::cast,
        datatypes::{Field, Fields, Schema},
    };

    use super::*;

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("name", DataType::Utf8, true),
            Field::new(
                "tags",
                DataType::List(Arc::new(Field::new("item", DataType::Int32, true))),
                true,
            ),
        ]))
    }

    fn batch(schema: &SchemaRef, ids: Vec<i32>) -> RecordBatch {
        let names: Vec<Option<String>> = ids
            .iter()
            .map(|id| (id % 2 == 0).then(|| format!("n{id}")))
            .collect();
        let tags = ListArray::from_iter_primitive::<Int32Type, _, _>(
            ids.iter().map(|id| Some(vec![Some(*id), Some(id * 10)])),
        );
        RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(ids)),
                Arc::new(StringArray::from(names)),
                Arc::new(tags),
            ],
        )
        .expect("record batch")
    }

    fn decoder() -> ArrowDecoder {
        let schema = schema();
        let batches = vec![
            batch(&schema, vec![0, 1, 2]),
            batch(&schema, Vec::new()),
            batch(&schema, vec![3, 4]),
        ];
        ArrowDecoder::new(schema, batches).expect("decoder")
    }

    #[test]
    fn counts_rows_across_batches() {
        let decoder = decoder();
        assert_eq!(decoder.row_count(), 5);
        assert_eq!(decoder.row_group_rows(), Some(3));
    }

    #[test]
    fn resolves_repetition() {
        let decoder = decoder();
        assert!(!decoder.resolve_path("id").expect("id").repeated);
        assert!(decoder.resolve_path("tags").expect("tags").repeated);
        assert!(matches!(
            decoder.resolve_path("missing"),
            Err(DecodeError::UnknownColumn(path)) if path == "missing"
        ));
    }

    #[test]
    fn column_stream_skips_across_batch_boundaries() {
        let decoder = decoder();
        let column = decoder.resolve_path("id").expect("id");
        let mut stream = decoder.open_column(&column).expect("stream");
        assert_eq!(stream.read_one().expect("row 0"), Value::Int32(0));
        stream.skip(2).expect("skip");
        assert_eq!(stream.read_one().expect("row 3"), Value::Int32(3));
        assert!(matches!(
            stream.skip(5),
            Err(DecodeError::OutOfRange { requested: 9, available: 5 })
        ));
    }

    #[test]
    fn cells_keep_nulls_and_lists() {
        let decoder = decoder();
        let name = decoder.resolve_path("name").expect("name");
        let mut names = decoder.open_column(&name).expect("stream");
        assert_eq!(names.read_one().expect("row 0"), Value::Utf8("n0".into()));
        assert_eq!(names.read_one().expect("row 1"), Value::Null);

        let tags = decoder.resolve_path("tags").expect("tags");
        let mut tags = decoder.open_column(&tags).expect("stream");
        tags.skip(4).expect("skip");
        assert_eq!(
            tags.read_one().expect("row 4"),
            Value::List(vec![Value::Int32(4), Value::Int32(40)])
        );
    }

    #[test]
    fn row_stream_reads_windows() {
        let decoder = decoder();
        let mut rows = decoder.open_rows().expect("rows");
        rows.skip(1).expect("skip");
        let window = rows.read_n(3).expect("read");
        let ids: Vec<_> = window.iter().map(|row| row.get("id").cloned()).collect();
        assert_eq!(
            ids,
            vec![Some(Value::Int32(1)), Some(Value::Int32(2)), Some(Value::Int32(3))]
        );
        assert_eq!(rows.read_n(10).expect("tail").len(), 1);
        assert!(rows.read_n(1).expect("end").is_empty());
        assert_eq!(decoder.read_all_rows().expect("all").len(), 5);
    }

    #[test]
    fn rejects_mismatched_batches() {
        let other = Arc::new(Schema::new(vec![Field::new("x", DataType::Float32, false)]));
        let foreign = RecordBatch::try_new(
            other,
            vec![Arc::new(Float32Array::from(vec![1.0f32]))],
        )
        .expect("record batch");
        assert!(matches!(
            ArrowDecoder::new(schema(), vec![foreign]),
            Err(DecodeError::Unsupported(_))
        ));
    }

    #[test]
    fn half_floats_widen() {
        let halves = cast(&Float32Array::from(vec![1.5f32, -0.25]), &DataType::Float16)
            .expect("cast to f16");
        let batch = RecordBatch::try_from_iter(vec![("h", halves)]).expect("record batch");
        let decoder = ArrowDecoder::from_batch(batch);
        let column = decoder.resolve_path("h").expect("h");
        let mut stream = decoder.open_column(&column).expect("stream");
        assert_eq!(stream.read_one().expect("row 0"), Value::Float32(1.5));
        assert_eq!(stream.read_one().expect("row 1"), Value::Float32(-0.25));
    }

    #[test]
    fn dictionaries_decode_to_their_values() {
        let venues: DictionaryArray<Int32Type> =
            vec![Some("XSTO"), None, Some("XHEL"), Some("XSTO")].into_iter().collect();
        let batch = RecordBatch::try_from_iter(vec![("venue", Arc::new(venues) as ArrayRef)])
            .expect("record batch");
        let decoder = ArrowDecoder::from_batch(batch);
        let column = decoder.resolve_path("venue").expect("venue");
        assert!(!column.repeated);
        let mut stream = decoder.open_column(&column).expect("stream");
        assert_eq!(stream.read_one().expect("row 0"), Value::Utf8("XSTO".into()));
        assert_eq!(stream.read_one().expect("row 1"), Value::Null);
        stream.skip(1).expect("skip");
        assert_eq!(stream.read_one().expect("row 3"), Value::Utf8("XSTO".into()));
    }

    #[test]
    fn dotted_paths_reach_struct_children() {
        let fields = Fields::from(vec![
            Field::new("city", DataType::Utf8, false),
            Field::new("zip", DataType::Int32, false),
        ]);
        let address = StructArray::new(
            fields,
            vec![
                Arc::new(StringArray::from(vec!["Oslo", "Lund"])) as ArrayRef,
                Arc::new(Int32Array::from(vec![150, 221])) as ArrayRef,
            ],
            None,
        );
        let batch = RecordBatch::try_from_iter(vec![("address", Arc::new(address) as ArrayRef)])
            .expect("record batch");
        let decoder = ArrowDecoder::from_batch(batch);

        let zip = decoder.resolve_path("address.zip").expect("zip");
        let mut stream = decoder.open_column(&zip).expect("stream");
        stream.skip(1).expect("skip");
        assert_eq!(stream.read_one().expect("row 1"), Value::Int32(221));
        assert!(matches!(
            decoder.resolve_path("address.street"),
            Err(DecodeError::UnknownColumn(_))
        ));
        assert!(decoder.resolve_path("address.zip.more").is_err());
    }
}
