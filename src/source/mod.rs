//! Source module
//!
//! Producers of columnar batches.
//!
//! # Overview
//!
//! - `Source` - the capability the transfer engine pulls from
//! - `MemorySource` - batches held in memory
//! - `CsvSource` - delimited text typed by an inferred schema
//! - `ReaderSource` - Parquet, NDJSON and Arrow IPC files via the Arrow readers

mod delimited;
mod readers;
mod types;

pub use delimited::{CsvSource, DEFAULT_CSV_BATCH_SIZE};
pub use readers::{ReaderSource, DEFAULT_READER_BATCH_SIZE};
pub use types::{MemorySource, Source};

#[cfg(test)]
mod tests;
