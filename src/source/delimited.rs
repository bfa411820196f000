//! Delimited text source typed by an inferred schema
//!
//! Values are parsed with the same null and timestamp rules the inferrer
//! used, so a column inferred as `Int64` reads back as an `Int64Array`.

use super::types::Source;
use crate::error::{Error, Result};
use crate::schema::{
    open_file, parse_bool, parse_timestamp, InferenceOptions, InferredField, InferredSchema,
    TypeTag,
};
use crate::types::{Batch, SchemaRef};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use async_trait::async_trait;
use csv::{StringRecord, StringRecordsIntoIter};
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Default number of rows per batch
pub const DEFAULT_CSV_BATCH_SIZE: usize = 8192;

type RecordIter = StringRecordsIntoIter<Box<dyn Read + Send>>;

/// Source reading delimited text into typed batches
pub struct CsvSource {
    records: Option<RecordIter>,
    schema: SchemaRef,
    fields: Vec<InferredField>,
    options: InferenceOptions,
    batch_size: usize,
    rows_read: u64,
}

impl CsvSource {
    /// Create a source over a reader
    ///
    /// When the options say a header is present, the header row is consumed
    /// here and must have as many columns as the schema.
    pub fn new<R>(reader: R, schema: &InferredSchema, options: InferenceOptions) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        options.validate()?;
        let boxed: Box<dyn Read + Send> = Box::new(reader);
        let mut records = options.csv_reader(boxed)?.into_records();

        if options.has_header {
            if let Some(header) = records.next() {
                let header = header?;
                if header.len() != schema.len() {
                    return Err(Error::schema(format!(
                        "Header has {} columns, schema has {}",
                        header.len(),
                        schema.len()
                    )));
                }
            }
        }

        Ok(Self {
            records: Some(records),
            schema: schema.to_arrow_ref(),
            fields: schema.fields.clone(),
            options,
            batch_size: DEFAULT_CSV_BATCH_SIZE,
            rows_read: 0,
        })
    }

    /// Open a file
    pub fn from_path(
        path: impl AsRef<Path>,
        schema: &InferredSchema,
        options: InferenceOptions,
    ) -> Result<Self> {
        let file = open_file(path.as_ref())?;
        Self::new(BufReader::new(file), schema, options)
    }

    /// Set rows per batch
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Data rows read so far
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    fn build_batch(&self, rows: &[StringRecord]) -> Result<Batch> {
        let columns = self
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| build_column(field, index, rows, &self.options))
            .collect::<Result<Vec<_>>>()?;
        Ok(Batch::try_new(self.schema.clone(), columns)?)
    }
}

#[async_trait]
impl Source for CsvSource {
    async fn read(&mut self) -> Result<Option<Batch>> {
        let records = self
            .records
            .take()
            .ok_or_else(|| Error::source("Read from closed CSV source"))?;
        let width = self.fields.len();
        let batch_size = self.batch_size;

        // Parsing blocks on the underlying reader. A read dropped mid-batch
        // leaves the source closed.
        let (records, rows) = tokio::task::spawn_blocking(move || {
            let mut records = records;
            let rows = next_rows(&mut records, batch_size, width);
            (records, rows)
        })
        .await
        .map_err(|e| Error::source(format!("CSV reader task failed: {e}")))?;
        self.records = Some(records);

        let rows = rows?;
        if rows.is_empty() {
            return Ok(None);
        }

        self.rows_read += rows.len() as u64;
        self.build_batch(&rows).map(Some)
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    async fn close(&mut self) -> Result<()> {
        if self.records.take().is_some() {
            debug!("Closed CSV source after {} rows", self.rows_read);
        }
        Ok(())
    }
}

fn next_rows(records: &mut RecordIter, batch_size: usize, width: usize) -> Result<Vec<StringRecord>> {
    let mut rows = Vec::with_capacity(batch_size);
    for record in records.by_ref().take(batch_size) {
        let record = record?;
        if record.len() != width {
            return Err(Error::RowArity {
                line: record.position().map_or(0, csv::Position::line),
                expected: width,
                found: record.len(),
            });
        }
        rows.push(record);
    }
    Ok(rows)
}

fn build_column(
    field: &InferredField,
    index: usize,
    rows: &[StringRecord],
    options: &InferenceOptions,
) -> Result<ArrayRef> {
    // Arity is checked before a batch is built
    let raw = rows
        .iter()
        .map(|row| row.get(index).filter(|raw| !options.is_null(raw)));

    let array: ArrayRef = match field.type_tag {
        TypeTag::Int64 => Arc::new(
            raw.map(|v| parse_value(field, v, |s| s.parse::<i64>().ok()))
                .collect::<Result<Int64Array>>()?,
        ),
        TypeTag::Float64 => Arc::new(
            raw.map(|v| parse_value(field, v, |s| s.parse::<f64>().ok()))
                .collect::<Result<Float64Array>>()?,
        ),
        TypeTag::Boolean => Arc::new(
            raw.map(|v| parse_value(field, v, parse_bool))
                .collect::<Result<BooleanArray>>()?,
        ),
        TypeTag::Timestamp => {
            let format = options.timestamp_format.as_deref().ok_or_else(|| {
                Error::schema(format!(
                    "Column '{}' is a timestamp but no timestamp format is configured",
                    field.name
                ))
            })?;
            Arc::new(
                raw.map(|v| parse_value(field, v, |s| parse_timestamp(s, format)))
                    .collect::<Result<TimestampMicrosecondArray>>()?,
            )
        }
        TypeTag::String | TypeTag::Unset => Arc::new(raw.collect::<StringArray>()),
    };
    Ok(array)
}

fn parse_value<T>(
    field: &InferredField,
    value: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>> {
    value
        .map(|raw| {
            parse(raw.trim()).ok_or_else(|| {
                Error::schema(format!(
                    "Column '{}': cannot read {raw:?} as {}",
                    field.name, field.type_tag
                ))
            })
        })
        .transpose()
}
