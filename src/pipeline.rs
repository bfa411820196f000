//! Pipeline assembly
//!
//! Opens the endpoints a [`PipelineConfig`] names and runs one transfer
//! between them. Delimited sources are typed by running schema inference
//! over the file first.

use crate::config::{EndpointConfig, PipelineConfig};
use crate::engine::{TransferEngine, TransferMetrics};
use crate::error::Result;
use crate::schema::{InferenceOptions, SchemaInferrer};
use crate::sink::{CsvSink, IpcSink, NdjsonSink, ParquetSink, ParquetSinkOptions, Sink};
use crate::source::{CsvSource, ReaderSource, Source, DEFAULT_READER_BATCH_SIZE};
use crate::types::{DataFormat, SchemaRef};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Inference options for a delimited file
///
/// A `.tsv` path reads tab separated unless a delimiter was set explicitly.
pub fn delimited_options(path: &Path, options: &InferenceOptions) -> InferenceOptions {
    match (options.delimiter, DataFormat::default_delimiter(path)) {
        (None, Some(delimiter)) => options.clone().with_delimiter(delimiter),
        _ => options.clone(),
    }
}

/// Open a source for an endpoint
pub async fn open_source(
    endpoint: &EndpointConfig,
    inference: &InferenceOptions,
    cancel: &CancellationToken,
) -> Result<Box<dyn Source>> {
    let path = endpoint.path.as_path();
    let format = endpoint.resolve_format()?;

    let source: Box<dyn Source> = match format {
        DataFormat::Csv => {
            let options = delimited_options(path, inference);
            let outcome = SchemaInferrer::new(options.clone())
                .infer_path(path, cancel.clone())
                .await?;
            info!(
                "Inferred {} columns for {} from {} rows",
                outcome.schema.len(),
                path.display(),
                outcome.rows_sampled
            );
            Box::new(CsvSource::from_path(path, &outcome.schema, options)?)
        }
        DataFormat::Ndjson => Box::new(ReaderSource::ndjson(
            path,
            None,
            DEFAULT_READER_BATCH_SIZE,
        )?),
        DataFormat::Parquet => Box::new(ReaderSource::parquet(path, DEFAULT_READER_BATCH_SIZE)?),
        DataFormat::Ipc => Box::new(ReaderSource::ipc(path)?),
    };

    Ok(source)
}

/// Open a sink for an endpoint
pub fn open_sink(
    endpoint: &EndpointConfig,
    schema: SchemaRef,
    parquet: &ParquetSinkOptions,
) -> Result<Box<dyn Sink>> {
    let path = endpoint.path.as_path();

    let sink: Box<dyn Sink> = match endpoint.resolve_format()? {
        DataFormat::Csv => {
            let delimiter = DataFormat::default_delimiter(path).unwrap_or(',');
            Box::new(CsvSink::create(path, delimiter as u8)?)
        }
        DataFormat::Ndjson => Box::new(NdjsonSink::create(path)?),
        DataFormat::Parquet => Box::new(ParquetSink::create(path, schema, parquet)?),
        DataFormat::Ipc => Box::new(IpcSink::create(path, schema)?),
    };

    Ok(sink)
}

/// Run a configured pipeline to completion
pub async fn run_pipeline(
    config: &PipelineConfig,
    cancel: CancellationToken,
) -> Result<TransferMetrics> {
    config.validate()?;
    info!(
        "Pipeline {} -> {}",
        config.source.path.display(),
        config.sink.path.display()
    );

    let mut source = open_source(&config.source, &config.inference, &cancel).await?;
    let sink = match open_sink(&config.sink, source.schema(), &config.parquet) {
        Ok(sink) => sink,
        Err(e) => {
            if let Err(close) = source.close().await {
                warn!("Source close failed after sink error: {close}");
            }
            return Err(e);
        }
    };

    let mut engine = TransferEngine::from_boxed(source, sink).with_config(config.transfer.clone());
    let result = engine.start(cancel).await;
    if let Err(e) = &result {
        let metrics = engine.metrics();
        warn!(
            "Pipeline {} after {} batches read, {} written ({} rows written): {e}",
            engine.state(),
            metrics.batches_read,
            metrics.batches_written,
            metrics.rows_written
        );
    }
    result
}
