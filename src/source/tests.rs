//! Tests for source module

use super::*;
use crate::error::Error;
use crate::schema::{InferenceOptions, InferredField, InferredSchema, SchemaInferrer, TypeTag};
use crate::types::Batch;
use arrow::array::{
    Array, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use std::io::Write;
use std::sync::Arc;

fn int_batch(values: Vec<i64>) -> Batch {
    let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, false)]));
    Batch::try_new(schema, vec![Arc::new(Int64Array::from(values))]).unwrap()
}

fn csv_source(text: &'static str, options: InferenceOptions) -> CsvSource {
    let outcome = SchemaInferrer::new(options.clone()).infer_str(text).unwrap();
    CsvSource::new(text.as_bytes(), &outcome.schema, options).unwrap()
}

// ============================================================================
// MemorySource Tests
// ============================================================================

#[tokio::test]
async fn test_memory_source_yields_in_order() {
    let mut source =
        MemorySource::from_batches(vec![int_batch(vec![1, 2]), int_batch(vec![3])]).unwrap();
    assert_eq!(source.remaining(), 2);

    let first = source.read().await.unwrap().unwrap();
    assert_eq!(first.num_rows(), 2);
    let second = source.read().await.unwrap().unwrap();
    assert_eq!(second.num_rows(), 1);
    assert!(source.read().await.unwrap().is_none());
    assert!(source.read().await.unwrap().is_none());
}

#[tokio::test]
async fn test_memory_source_close_is_idempotent() {
    let mut source = MemorySource::from_batches(vec![int_batch(vec![1])]).unwrap();
    source.close().await.unwrap();
    source.close().await.unwrap();
    assert!(source.read().await.is_err());
}

#[test]
fn test_memory_source_rejects_schema_mismatch() {
    let other = Arc::new(Schema::new(vec![Field::new("s", DataType::Utf8, true)]));
    let err = MemorySource::new(other, vec![int_batch(vec![1])]).unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
    assert!(MemorySource::from_batches(Vec::new()).is_err());
}

// ============================================================================
// CsvSource Tests
// ============================================================================

#[tokio::test]
async fn test_csv_source_reads_typed_columns() {
    let text = "id,name,score,active\n1,alice,9.5,true\n2,,7,false\n3,carol,,TRUE\n";
    let mut source = csv_source(text, InferenceOptions::default());

    let batch = source.read().await.unwrap().unwrap();
    assert_eq!(batch.num_rows(), 3);
    assert!(source.read().await.unwrap().is_none());
    assert_eq!(source.rows_read(), 3);

    let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(ids.values().to_vec(), vec![1, 2, 3]);

    let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(names.value(0), "alice");
    assert!(names.is_null(1));

    let scores = batch.column(2).as_any().downcast_ref::<Float64Array>().unwrap();
    assert_eq!(scores.value(1), 7.0);
    assert!(scores.is_null(2));

    let active = batch.column(3).as_any().downcast_ref::<BooleanArray>().unwrap();
    assert!(active.value(0));
    assert!(!active.value(1));
    assert!(active.value(2));
}

#[tokio::test]
async fn test_csv_source_batches() {
    let text = "n\n1\n2\n3\n4\n5\n";
    let mut source = csv_source(text, InferenceOptions::default()).with_batch_size(2);

    let mut sizes = Vec::new();
    while let Some(batch) = source.read().await.unwrap() {
        sizes.push(batch.num_rows());
    }
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[tokio::test]
async fn test_csv_source_without_header() {
    let options = InferenceOptions::default().with_header(false);
    let mut source = csv_source("10,x\n20,y\n", options);

    assert_eq!(source.schema().field(0).name(), "col0");
    let batch = source.read().await.unwrap().unwrap();
    assert_eq!(batch.num_rows(), 2);
}

#[tokio::test]
async fn test_csv_source_timestamps() {
    let options = InferenceOptions::default().with_timestamp_format("%Y-%m-%d %H:%M:%S");
    let mut source = csv_source("at\n1970-01-01 00:00:02\n\n", options);

    let batch = source.read().await.unwrap().unwrap();
    let at = batch
        .column(0)
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .unwrap();
    assert_eq!(at.value(0), 2_000_000);
}

#[tokio::test]
async fn test_csv_source_value_beyond_sample() {
    let schema = InferredSchema::new(vec![InferredField::new("n", TypeTag::Int64, false)]);
    let mut source = CsvSource::new(
        "n\n1\nnot-a-number\n".as_bytes(),
        &schema,
        InferenceOptions::default(),
    )
    .unwrap();

    let err = source.read().await.unwrap_err();
    assert!(err.to_string().contains("cannot read \"not-a-number\" as int64"));
}

#[tokio::test]
async fn test_csv_source_row_arity() {
    let schema = InferredSchema::new(vec![
        InferredField::new("a", TypeTag::Int64, false),
        InferredField::new("b", TypeTag::Int64, false),
    ]);
    let mut source =
        CsvSource::new("a,b\n1,2\n3\n".as_bytes(), &schema, InferenceOptions::default()).unwrap();

    assert!(matches!(
        source.read().await.unwrap_err(),
        Error::RowArity { expected: 2, found: 1, .. }
    ));
}

#[test]
fn test_csv_source_header_mismatch() {
    let schema = InferredSchema::new(vec![InferredField::new("a", TypeTag::Int64, false)]);
    let result = CsvSource::new("a,b\n1,2\n".as_bytes(), &schema, InferenceOptions::default());
    assert!(matches!(result, Err(Error::Schema { .. })));
}

#[tokio::test]
async fn test_csv_source_from_path_and_close() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "x;y").unwrap();
    writeln!(file, "1;NA").unwrap();

    let options = InferenceOptions::default()
        .with_delimiter(';')
        .with_null_value("NA");
    let outcome = SchemaInferrer::new(options.clone())
        .infer_str("x;y\n1;NA\n")
        .unwrap();
    let mut source = CsvSource::from_path(file.path(), &outcome.schema, options).unwrap();

    let batch = source.read().await.unwrap().unwrap();
    assert_eq!(batch.num_rows(), 1);
    assert!(batch.column(1).is_null(0));

    source.close().await.unwrap();
    source.close().await.unwrap();
    assert!(source.read().await.is_err());
}

// ============================================================================
// ReaderSource Tests
// ============================================================================

#[tokio::test]
async fn test_ndjson_source_infers_schema() {
    let mut file = tempfile::Builder::new().suffix(".ndjson").tempfile().unwrap();
    writeln!(file, r#"{{"id": 1, "name": "a"}}"#).unwrap();
    writeln!(file, r#"{{"id": 2, "name": "b"}}"#).unwrap();
    file.flush().unwrap();

    let mut source = ReaderSource::ndjson(file.path(), None, DEFAULT_READER_BATCH_SIZE).unwrap();
    assert_eq!(source.format(), crate::types::DataFormat::Ndjson);
    assert_eq!(
        source.schema().field_with_name("id").unwrap().data_type(),
        &DataType::Int64
    );

    let batch = source.read().await.unwrap().unwrap();
    assert_eq!(batch.num_rows(), 2);
    assert!(source.read().await.unwrap().is_none());
    source.close().await.unwrap();
}

#[test]
fn test_reader_source_missing_file() {
    assert!(matches!(
        ReaderSource::parquet("/definitely/not/here.parquet", 10),
        Err(Error::FileNotFound { .. })
    ));
}
