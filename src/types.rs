//! Common types used throughout batchflow
//!
//! This module contains shared type definitions and type aliases
//! used across multiple modules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// Columnar batch moved through the pipeline
pub type Batch = arrow::record_batch::RecordBatch;

/// Shared, immutable Arrow schema
pub type SchemaRef = arrow::datatypes::SchemaRef;

// ============================================================================
// Data Format
// ============================================================================

/// On-disk format of a source or sink endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Delimited text; typed via schema inference when read
    Csv,
    /// Newline-delimited JSON
    Ndjson,
    /// Apache Parquet
    Parquet,
    /// Arrow IPC file format
    Ipc,
}

impl DataFormat {
    /// Detect a format from a file extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                Error::validation(format!(
                    "Cannot detect format of '{}': no file extension",
                    path.display()
                ))
            })?;

        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(DataFormat::Csv),
            "json" | "jsonl" | "ndjson" => Ok(DataFormat::Ndjson),
            "parquet" | "pq" => Ok(DataFormat::Parquet),
            "arrow" | "ipc" | "feather" => Ok(DataFormat::Ipc),
            other => Err(Error::validation(format!(
                "Unsupported file extension '.{other}' for '{}'",
                path.display()
            ))),
        }
    }

    /// Default delimiter implied by a path (tab for `.tsv`)
    pub fn default_delimiter(path: impl AsRef<Path>) -> Option<char> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.eq_ignore_ascii_case("tsv"))
            .map(|_| '\t')
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Csv => write!(f, "csv"),
            DataFormat::Ndjson => write!(f, "ndjson"),
            DataFormat::Parquet => write!(f, "parquet"),
            DataFormat::Ipc => write!(f, "ipc"),
        }
    }
}

impl FromStr for DataFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" | "tsv" => Ok(DataFormat::Csv),
            "json" | "jsonl" | "ndjson" => Ok(DataFormat::Ndjson),
            "parquet" => Ok(DataFormat::Parquet),
            "ipc" | "arrow" => Ok(DataFormat::Ipc),
            other => Err(Error::validation(format!("Unknown data format: {other}"))),
        }
    }
}
