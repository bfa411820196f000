//! # batchflow
//!
//! Concurrent transfer of Arrow record batches from a source to a sink, with
//! schema inference for untyped delimited text.
//!
//! ## Features
//!
//! - **Transfer Engine**: a puller and a pusher joined by a bounded queue, with
//!   backpressure, fail-fast error propagation and cooperative cancellation
//! - **Schema Inference**: samples delimited text on a worker pool and widens
//!   per-column types into a typed schema
//! - **Sources and Sinks**: CSV, NDJSON, Parquet and Arrow IPC files, plus
//!   in-memory endpoints
//! - **Arrow Native**: batches move by value as Arrow `RecordBatch`es
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use batchflow::{run_pipeline, EndpointConfig, PipelineConfig, Result};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PipelineConfig::new(
//!         EndpointConfig::new("data/events.csv"),
//!         EndpointConfig::new("out/events.parquet"),
//!     );
//!
//!     let metrics = run_pipeline(&config, CancellationToken::new()).await?;
//!     println!("{} rows", metrics.rows_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   infer    ┌────────────────┐
//! │ text source  │ ─────────► │ InferredSchema │
//! └──────────────┘            └───────┬────────┘
//!                                     │ typed by
//! ┌──────────────┐  puller   ┌────────▼───────┐  pusher   ┌──────────────┐
//! │    Source    │ ────────► │ bounded queue  │ ────────► │     Sink     │
//! └──────────────┘           └────────────────┘           └──────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Schema inference for delimited text
pub mod schema;

/// Batch sources
pub mod source;

/// Batch sinks
pub mod sink;

/// Transfer engine
pub mod engine;

/// Pipeline configuration
pub mod config;

/// Endpoint factories and pipeline runner
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{EndpointConfig, PipelineConfig};
pub use engine::{TransferConfig, TransferEngine, TransferMetrics, TransferState};
pub use pipeline::{open_sink, open_source, run_pipeline};
pub use schema::{InferenceOptions, InferenceOutcome, InferredSchema, SchemaInferrer, TypeTag};
pub use sink::Sink;
pub use source::Source;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
