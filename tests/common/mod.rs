//! Common test utilities for integration tests.
#![allow(dead_code)]

use std::{fs::File, path::PathBuf, sync::Arc};

use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, Int64Array, ListArray, StringArray, StructArray},
    datatypes::{DataType, Field, Fields, Int64Type, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};
use sieve::{ArrowRow, Value};
use tempfile::TempDir;

pub const VENUES: [&str; 4] = ["XSTO", "XHEL", "XCSE", "XOSL"];

/// Schema of the generated trades table.
pub fn trades_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("qty", DataType::Int32, false),
        Field::new("venue", DataType::Utf8, false),
        Field::new("price", DataType::Float64, false),
        Field::new(
            "tags",
            DataType::List(Arc::new(Field::new("item", DataType::Int64, true))),
            true,
        ),
    ]))
}

/// Deterministic pseudo-random trades starting at `first_id`.
pub fn trades(rows: usize, first_id: i64, seed: u64) -> RecordBatch {
    let mut rng = fastrand::Rng::with_seed(seed);
    let ids: Vec<i64> = (0..rows as i64).map(|i| first_id + i).collect();
    let qty: Vec<i32> = (0..rows).map(|_| rng.i32(0..100)).collect();
    let venue: Vec<&str> = (0..rows).map(|_| VENUES[rng.usize(..VENUES.len())]).collect();
    let price: Vec<f64> = (0..rows).map(|_| f64::from(rng.u8(0..40)) / 4.0).collect();
    let tags = ListArray::from_iter_primitive::<Int64Type, _, _>((0..rows).map(|_| {
        let len = rng.usize(0..4);
        Some((0..len).map(|_| Some(rng.i64(0..10))).collect::<Vec<_>>())
    }));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(ids)),
        Arc::new(Int32Array::from(qty)),
        Arc::new(StringArray::from(venue)),
        Arc::new(Float64Array::from(price)),
        Arc::new(tags),
    ];
    RecordBatch::try_new(trades_schema(), columns).expect("record batch")
}

/// The three-row `{a, b}` table used by the end-to-end examples.
pub fn abc_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("a", DataType::Int32, false),
        Field::new("b", DataType::Utf8, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int32Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec!["x", "y", "x"])),
        ],
    )
    .expect("record batch")
}

/// A table with a nested `address` struct.
pub fn people_batch() -> RecordBatch {
    let address_fields = Fields::from(vec![
        Field::new("city", DataType::Utf8, false),
        Field::new("zip", DataType::Int32, false),
    ]);
    let address = StructArray::new(
        address_fields.clone(),
        vec![
            Arc::new(StringArray::from(vec!["Oslo", "Lund", "Oslo", "Turku"])) as ArrayRef,
            Arc::new(Int32Array::from(vec![150, 221, 151, 200])) as ArrayRef,
        ],
        None,
    );
    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("address", DataType::Struct(address_fields), false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["ada", "bo", "cy", "di"])),
            Arc::new(address),
        ],
    )
    .expect("record batch")
}

/// Writes `batches` to a parquet file in a fresh temporary directory.
pub fn write_parquet(batches: &[RecordBatch], max_row_group_size: usize) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("table.parquet");
    let file = File::create(&path).expect("create parquet file");
    let props = WriterProperties::builder()
        .set_max_row_group_size(max_row_group_size)
        .build();
    let schema = batches.first().expect("at least one batch").schema();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props)).expect("writer");
    for batch in batches {
        writer.write(batch).expect("write batch");
    }
    writer.close().expect("close writer");
    (dir, path)
}

/// Values of a decoded row in column order.
pub fn arrow_values(row: &ArrowRow) -> Vec<Value> {
    row.values().to_vec()
}

/// Reads an `Int64` column out of decoded arrow rows.
pub fn int64_column(rows: &[ArrowRow], column: &str) -> Vec<i64> {
    rows.iter()
        .map(|row| match row.get(column) {
            Some(Value::Int64(v)) => *v,
            other => panic!("expected int64 in {column}, got {other:?}"),
        })
        .collect()
}
