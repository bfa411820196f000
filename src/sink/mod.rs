//! Sink module
//!
//! Consumers of columnar batches.
//!
//! # Overview
//!
//! This module provides:
//! - `Sink` - the capability the transfer engine pushes into
//! - `MemorySink` - collects batches for inspection
//! - `ParquetSink` - Parquet files with configurable compression
//! - `CsvSink`, `NdjsonSink`, `IpcSink` - text and Arrow IPC files

mod files;
mod parquet_sink;
mod types;

pub use files::{CsvSink, IpcSink, NdjsonSink};
pub use parquet_sink::{ParquetCompression, ParquetSink, ParquetSinkOptions};
pub use types::{MemorySink, MemorySinkHandle, Sink};
