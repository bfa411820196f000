//! Parquet file sink
//!
//! Writes Arrow RecordBatches to a single Parquet file.

use super::types::Sink;
use crate::error::{Error, Result, ResultExt};
use crate::types::{Batch, SchemaRef};
use async_trait::async_trait;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compression codec for Parquet output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    /// No compression
    None,
    /// Snappy (default)
    #[default]
    Snappy,
    /// ZSTD at the default level
    Zstd,
    /// GZIP at the default level
    Gzip,
}

impl From<ParquetCompression> for Compression {
    fn from(compression: ParquetCompression) -> Self {
        match compression {
            ParquetCompression::None => Compression::UNCOMPRESSED,
            ParquetCompression::Snappy => Compression::SNAPPY,
            ParquetCompression::Zstd => Compression::ZSTD(ZstdLevel::default()),
            ParquetCompression::Gzip => Compression::GZIP(GzipLevel::default()),
        }
    }
}

/// Configuration for the Parquet sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParquetSinkOptions {
    /// Compression codec
    pub compression: ParquetCompression,
    /// Maximum rows per row group
    pub row_group_size: usize,
    /// Dictionary encoding
    pub dictionary_enabled: bool,
    /// Column statistics
    pub statistics_enabled: bool,
}

impl Default for ParquetSinkOptions {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::Snappy,
            row_group_size: 1024 * 1024, // 1M rows
            dictionary_enabled: true,
            statistics_enabled: true,
        }
    }
}

impl ParquetSinkOptions {
    /// Create options with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression codec
    #[must_use]
    pub fn with_compression(mut self, compression: ParquetCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Enable or disable dictionary encoding
    #[must_use]
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.dictionary_enabled = enabled;
        self
    }

    /// Enable or disable statistics
    #[must_use]
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics_enabled = enabled;
        self
    }

    /// Build writer properties
    fn build_properties(&self) -> WriterProperties {
        let mut builder = WriterProperties::builder()
            .set_compression(self.compression.into())
            .set_max_row_group_size(self.row_group_size.max(1));

        if !self.dictionary_enabled {
            builder = builder.set_dictionary_enabled(false);
        }

        if !self.statistics_enabled {
            builder = builder.set_statistics_enabled(EnabledStatistics::None);
        }

        builder.build()
    }
}

/// Sink writing one Parquet file
pub struct ParquetSink {
    path: PathBuf,
    writer: Option<ArrowWriter<File>>,
    rows_written: usize,
}

impl ParquetSink {
    /// Create the file and a writer for `schema`
    pub fn create(
        path: impl AsRef<Path>,
        schema: SchemaRef,
        options: &ParquetSinkOptions,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;

        let writer = ArrowWriter::try_new(file, schema, Some(options.build_properties()))?;

        Ok(Self {
            path,
            writer: Some(writer),
            rows_written: 0,
        })
    }

    /// Rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[async_trait]
impl Sink for ParquetSink {
    async fn write(&mut self, batch: Batch) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::sink("Write to closed Parquet sink"))?;
        writer.write(&batch)?;
        self.rows_written += batch.num_rows();
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.close()?;
            debug!(
                "Closed Parquet sink {} after {} rows",
                self.path.display(),
                self.rows_written
            );
        }
        Ok(())
    }
}
