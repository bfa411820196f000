//! Text and Arrow IPC file sinks

use super::types::Sink;
use crate::error::{Error, Result, ResultExt};
use crate::types::{Batch, SchemaRef};
use arrow::csv::WriterBuilder;
use arrow::ipc::writer::FileWriter;
use arrow::json::LineDelimitedWriter;
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .with_context(|| format!("Failed to create {}", path.display()))
}

// ============================================================================
// CSV Sink
// ============================================================================

/// Sink writing delimited text with a header row
pub struct CsvSink {
    writer: Option<arrow::csv::Writer<BufWriter<File>>>,
    rows_written: usize,
}

impl CsvSink {
    /// Create the file
    pub fn create(path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let file = create_file(path.as_ref())?;
        let writer = WriterBuilder::new()
            .with_header(true)
            .with_delimiter(delimiter)
            .build(file);
        Ok(Self {
            writer: Some(writer),
            rows_written: 0,
        })
    }

    /// Rows written so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[async_trait]
impl Sink for CsvSink {
    async fn write(&mut self, batch: Batch) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::sink("Write to closed CSV sink"))?;
        writer.write(&batch)?;
        self.rows_written += batch.num_rows();
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.into_inner().flush()?;
            debug!("Closed CSV sink after {} rows", self.rows_written);
        }
        Ok(())
    }
}

// ============================================================================
// NDJSON Sink
// ============================================================================

/// Sink writing one JSON object per line
pub struct NdjsonSink {
    writer: Option<LineDelimitedWriter<BufWriter<File>>>,
    rows_written: usize,
}

impl NdjsonSink {
    /// Create the file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = create_file(path.as_ref())?;
        Ok(Self {
            writer: Some(LineDelimitedWriter::new(file)),
            rows_written: 0,
        })
    }

    /// Rows written so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[async_trait]
impl Sink for NdjsonSink {
    async fn write(&mut self, batch: Batch) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::sink("Write to closed NDJSON sink"))?;
        writer.write(&batch)?;
        self.rows_written += batch.num_rows();
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.finish()?;
            writer.into_inner().flush()?;
            debug!("Closed NDJSON sink after {} rows", self.rows_written);
        }
        Ok(())
    }
}

// ============================================================================
// IPC Sink
// ============================================================================

/// Sink writing the Arrow IPC file format
pub struct IpcSink {
    writer: Option<FileWriter<BufWriter<File>>>,
    rows_written: usize,
}

impl IpcSink {
    /// Create the file and write the schema header
    pub fn create(path: impl AsRef<Path>, schema: SchemaRef) -> Result<Self> {
        let file = create_file(path.as_ref())?;
        let writer = FileWriter::try_new(file, &schema)?;
        Ok(Self {
            writer: Some(writer),
            rows_written: 0,
        })
    }

    /// Rows written so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[async_trait]
impl Sink for IpcSink {
    async fn write(&mut self, batch: Batch) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::sink("Write to closed IPC sink"))?;
        writer.write(&batch)?;
        self.rows_written += batch.num_rows();
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.finish()?;
            writer.into_inner()?.flush()?;
            debug!("Closed IPC sink after {} rows", self.rows_written);
        }
        Ok(())
    }
}
