//! File sources backed by the Arrow readers

use super::types::Source;
use crate::error::{Error, Result};
use crate::schema::open_file;
use crate::types::{Batch, DataFormat, SchemaRef};
use arrow::ipc::reader::FileReader;
use arrow::json::reader::infer_json_schema_from_seekable;
use arrow::json::ReaderBuilder;
use arrow::record_batch::RecordBatchReader;
use async_trait::async_trait;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Default number of rows per batch for Parquet and NDJSON
pub const DEFAULT_READER_BATCH_SIZE: usize = 8192;

/// Records sampled when an NDJSON schema has to be inferred
const NDJSON_INFERENCE_ROWS: usize = 1000;

/// Source over any Arrow `RecordBatchReader`
pub struct ReaderSource {
    format: DataFormat,
    reader: Option<Box<dyn RecordBatchReader + Send>>,
    schema: SchemaRef,
    batches_read: usize,
}

impl ReaderSource {
    /// Wrap an existing reader
    pub fn new(format: DataFormat, reader: Box<dyn RecordBatchReader + Send>) -> Self {
        let schema = reader.schema();
        Self {
            format,
            reader: Some(reader),
            schema,
            batches_read: 0,
        }
    }

    /// Open a Parquet file
    pub fn parquet(path: impl AsRef<Path>, batch_size: usize) -> Result<Self> {
        let file = open_file(path.as_ref())?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(batch_size.max(1))
            .build()?;
        Ok(Self::new(DataFormat::Parquet, Box::new(reader)))
    }

    /// Open a newline-delimited JSON file
    ///
    /// Without a schema, one is inferred from the leading records.
    pub fn ndjson(
        path: impl AsRef<Path>,
        schema: Option<SchemaRef>,
        batch_size: usize,
    ) -> Result<Self> {
        let mut file = BufReader::new(open_file(path.as_ref())?);
        let schema = match schema {
            Some(schema) => schema,
            None => {
                let (inferred, rows) =
                    infer_json_schema_from_seekable(&mut file, Some(NDJSON_INFERENCE_ROWS))?;
                debug!("Inferred NDJSON schema from {rows} records");
                Arc::new(inferred)
            }
        };
        let reader = ReaderBuilder::new(schema)
            .with_batch_size(batch_size.max(1))
            .build(file)?;
        Ok(Self::new(DataFormat::Ndjson, Box::new(reader)))
    }

    /// Open an Arrow IPC file
    pub fn ipc(path: impl AsRef<Path>) -> Result<Self> {
        let file = BufReader::new(open_file(path.as_ref())?);
        let reader = FileReader::try_new(file, None)?;
        Ok(Self::new(DataFormat::Ipc, Box::new(reader)))
    }

    /// Format this source reads
    pub fn format(&self) -> DataFormat {
        self.format
    }
}

#[async_trait]
impl Source for ReaderSource {
    async fn read(&mut self) -> Result<Option<Batch>> {
        let mut reader = self
            .reader
            .take()
            .ok_or_else(|| Error::source(format!("Read from closed {} source", self.format)))?;

        // Decoding does file IO; a read dropped mid-batch leaves the source closed
        let (reader, next) = tokio::task::spawn_blocking(move || {
            let next = reader.next();
            (reader, next)
        })
        .await
        .map_err(|e| Error::source(format!("{} reader task failed: {e}", self.format)))?;
        self.reader = Some(reader);

        match next.transpose()? {
            Some(batch) => {
                self.batches_read += 1;
                Ok(Some(batch))
            }
            None => Ok(None),
        }
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    async fn close(&mut self) -> Result<()> {
        if self.reader.take().is_some() {
            debug!(
                "Closed {} source after {} batches",
                self.format, self.batches_read
            );
        }
        Ok(())
    }
}
