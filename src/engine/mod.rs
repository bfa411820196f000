//! Execution engine module
//!
//! Moves batches from one source to one sink.
//!
//! # Overview
//!
//! The engine module provides:
//! - `TransferEngine` - runs a puller and a pusher over a bounded queue
//! - `TransferConfig` - queue capacity and progress logging
//! - `TransferMetrics` - batch and row counts with start and end times
//!
//! The bounded queue is the only throttle: a fast source blocks once it is
//! full. The first failure on either side cancels the other side and becomes
//! the result; nothing is retried and nothing already written is rolled back.

mod types;

pub(crate) use types::FirstError;
pub use types::{TransferConfig, TransferMetrics, TransferState, DEFAULT_QUEUE_CAPACITY};

use crate::error::{Error, Result, Stage};
use crate::sink::Sink;
use crate::source::Source;
use crate::types::Batch;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Transfer engine for a single source/sink pair
pub struct TransferEngine {
    /// Batch producer, handed to the puller on start
    source: Option<Box<dyn Source>>,
    /// Batch consumer, handed to the pusher on start
    sink: Option<Box<dyn Sink>>,
    /// Transfer configuration
    config: TransferConfig,
    /// Lifecycle state
    state: TransferState,
    /// Statistics
    metrics: TransferMetrics,
}

/// What the puller hands back when it exits
struct PullReport {
    source: Box<dyn Source>,
    batches: usize,
    rows: usize,
}

/// What the pusher hands back when it exits
struct PushReport {
    sink: Box<dyn Sink>,
    batches: usize,
    rows: usize,
}

impl TransferEngine {
    /// Create a new transfer engine
    pub fn new(source: impl Source + 'static, sink: impl Sink + 'static) -> Self {
        Self::from_boxed(Box::new(source), Box::new(sink))
    }

    /// Create a transfer engine from boxed endpoints
    pub fn from_boxed(source: Box<dyn Source>, sink: Box<dyn Sink>) -> Self {
        Self {
            source: Some(source),
            sink: Some(sink),
            config: TransferConfig::default(),
            state: TransferState::Idle,
            metrics: TransferMetrics::default(),
        }
    }

    /// Set transfer configuration
    #[must_use]
    pub fn with_config(mut self, config: TransferConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the lifecycle state
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Get statistics (final once the engine reaches a terminal state)
    pub fn metrics(&self) -> &TransferMetrics {
        &self.metrics
    }

    /// Run the transfer to completion
    ///
    /// Callable once. Validation errors are returned before any worker
    /// starts. Otherwise the source and sink are always closed, and the
    /// result is the first worker error, then caller cancellation, then the
    /// first close error.
    pub async fn start(&mut self, cancel: CancellationToken) -> Result<TransferMetrics> {
        if self.state != TransferState::Idle {
            return Err(Error::validation(format!(
                "Transfer engine cannot start from state '{}'",
                self.state
            )));
        }
        self.config.validate()?;

        let (Some(source), Some(sink)) = (self.source.take(), self.sink.take()) else {
            return Err(Error::validation("Transfer engine has no source or sink"));
        };

        self.state = TransferState::Running;
        self.metrics = TransferMetrics::started();
        info!(
            "Starting transfer (queue capacity {})",
            self.config.queue_capacity
        );

        let run = cancel.child_token();
        let errors = Arc::new(FirstError::default());
        let (tx, rx) = mpsc::channel::<Batch>(self.config.queue_capacity);

        let puller = tokio::spawn(pull(source, tx, run.clone(), errors.clone()));
        let pusher = tokio::spawn(push(
            sink,
            rx,
            run.clone(),
            errors.clone(),
            self.config.progress_interval,
        ));
        let (pulled, pushed) = tokio::join!(puller, pusher);

        let source = self.collect_pull(pulled, &errors);
        let sink = self.collect_push(pushed, &errors);

        let mut close_error: Option<Error> = None;
        if let Some(mut source) = source {
            if let Err(e) = source.close().await {
                close_error = Some(e);
            }
        }
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close().await {
                match close_error {
                    Some(_) => warn!("Sink close failed after source close failure: {e}"),
                    None => close_error = Some(e),
                }
            }
        }

        self.metrics.suppressed_errors = errors.suppressed();
        self.metrics.finish();

        let result = if let Some((stage, error)) = errors.take() {
            if let Some(e) = close_error {
                warn!("Close failed after transfer error: {e}");
            }
            Err(Error::pipeline(stage, error))
        } else if cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else if let Some(e) = close_error {
            Err(e)
        } else {
            Ok(())
        };

        self.state = match &result {
            Ok(()) => TransferState::Completed,
            Err(Error::Cancelled) => TransferState::Cancelled,
            Err(_) => TransferState::Failed,
        };

        match &result {
            Ok(()) => info!(
                "Transfer completed: {} batches, {} rows",
                self.metrics.batches_written, self.metrics.rows_written
            ),
            Err(e) => warn!("Transfer {}: {e}", self.state),
        }

        result.map(|()| self.metrics.clone())
    }

    fn collect_pull(
        &mut self,
        joined: std::result::Result<PullReport, JoinError>,
        errors: &FirstError,
    ) -> Option<Box<dyn Source>> {
        match joined {
            Ok(report) => {
                self.metrics.batches_read = report.batches;
                self.metrics.rows_read = report.rows;
                Some(report.source)
            }
            Err(e) => {
                errors.record(Stage::Pull, Error::Other(format!("Puller task failed: {e}")));
                None
            }
        }
    }

    fn collect_push(
        &mut self,
        joined: std::result::Result<PushReport, JoinError>,
        errors: &FirstError,
    ) -> Option<Box<dyn Sink>> {
        match joined {
            Ok(report) => {
                self.metrics.batches_written = report.batches;
                self.metrics.rows_written = report.rows;
                Some(report.sink)
            }
            Err(e) => {
                errors.record(Stage::Push, Error::Other(format!("Pusher task failed: {e}")));
                None
            }
        }
    }
}

/// Read batches and enqueue them until end of stream, failure or cancellation
///
/// Dropping `tx` on return closes the queue.
async fn pull(
    mut source: Box<dyn Source>,
    tx: mpsc::Sender<Batch>,
    cancel: CancellationToken,
    errors: Arc<FirstError>,
) -> PullReport {
    let mut batches = 0;
    let mut rows = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = source.read() => next,
        };

        let batch = match next {
            Ok(Some(batch)) => batch,
            Ok(None) => {
                debug!("Source exhausted after {batches} batches");
                break;
            }
            Err(e) => {
                errors.record(Stage::Pull, e);
                cancel.cancel();
                break;
            }
        };

        batches += 1;
        rows += batch.num_rows();

        // A cancelled send drops the batch with the send future
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            sent = tx.send(batch) => {
                if sent.is_err() {
                    // Pusher is gone
                    break;
                }
            }
        }
    }

    PullReport {
        source,
        batches,
        rows,
    }
}

/// Dequeue batches and write them until the queue closes, failure or cancellation
async fn push(
    mut sink: Box<dyn Sink>,
    mut rx: mpsc::Receiver<Batch>,
    cancel: CancellationToken,
    errors: Arc<FirstError>,
    progress_interval: usize,
) -> PushReport {
    let mut batches = 0;
    let mut rows = 0;

    loop {
        let batch = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            batch = rx.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };

        let batch_rows = batch.num_rows();
        let written = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            written = sink.write(batch) => written,
        };

        if let Err(e) = written {
            errors.record(Stage::Push, e);
            cancel.cancel();
            break;
        }

        batches += 1;
        rows += batch_rows;
        if progress_interval > 0 && batches % progress_interval == 0 {
            info!("Transferred {batches} batches ({rows} rows)");
        }
    }

    // Anything still queued is dropped with the receiver
    PushReport {
        sink,
        batches,
        rows,
    }
}
