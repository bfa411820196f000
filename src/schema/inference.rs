//! Schema inference from delimited text
//!
//! Rows are sampled by the calling thread and fanned out to a pool of
//! worker threads over a bounded channel. Each worker folds its rows into a
//! private `ColumnState` vector; the vectors are merged once the workers are
//! joined, so no column slot is ever shared between threads.

use super::types::{
    ColumnState, InferenceOptions, InferredField, InferredSchema, TypeTag, META_DELIMITER,
    META_HAS_HEADER, META_INFERRED_AT, META_SAMPLE_SIZE,
};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::StringRecord;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result of a schema inference run
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOutcome {
    /// The inferred schema
    pub schema: InferredSchema,
    /// Number of data rows sampled
    pub rows_sampled: usize,
}

/// Schema inferrer for delimited text
#[derive(Debug, Clone, Default)]
pub struct SchemaInferrer {
    options: InferenceOptions,
}

impl SchemaInferrer {
    /// Create a new schema inferrer
    pub fn new(options: InferenceOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub fn options(&self) -> &InferenceOptions {
        &self.options
    }

    /// Infer a schema from an in-memory string
    pub fn infer_str(&self, text: &str) -> Result<InferenceOutcome> {
        self.infer_reader(text.as_bytes(), &CancellationToken::new())
    }

    /// Infer a schema from a reader, blocking the calling thread
    ///
    /// The calling thread parses and dispatches rows; `worker_count()` scoped
    /// threads detect types.
    pub fn infer_reader<R: Read>(
        &self,
        reader: R,
        cancel: &CancellationToken,
    ) -> Result<InferenceOutcome> {
        self.options.validate()?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut records = self.options.csv_reader(reader)?.into_records();

        let first = match records.next() {
            Some(record) => record?,
            None => {
                debug!("Inference input is empty");
                return Ok(self.freeze(Vec::new(), Vec::new(), 0));
            }
        };

        let (columns, pending): (Vec<String>, Option<StringRecord>) = if self.options.has_header {
            let names = first.iter().map(|name| name.trim().to_string()).collect();
            (names, None)
        } else {
            let names = (0..first.len()).map(|i| format!("col{i}")).collect();
            (names, Some(first))
        };
        let width = columns.len();
        let workers = self.options.worker_count();

        debug!(
            "Inferring {width} columns with {workers} workers (max {} rows)",
            self.options.max_rows
        );

        let detector = ValueDetector::new(&self.options);
        let (tx, rx) = async_channel::bounded::<Vec<StringRecord>>(workers * 2);

        let (states, rows_sampled) = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker_id| {
                    let rx = rx.clone();
                    let detector = &detector;
                    scope.spawn(move || run_worker(worker_id, &rx, width, detector))
                })
                .collect();
            drop(rx);

            let rows = pending.into_iter().map(Ok).chain(records);
            let dispatched = self.dispatch(rows, width, tx, cancel);

            let mut merged = vec![ColumnState::default(); width];
            for handle in handles {
                let local = handle
                    .join()
                    .map_err(|_| Error::Other("Inference worker panicked".to_string()))?;
                for (slot, state) in merged.iter_mut().zip(&local) {
                    slot.merge(state);
                }
            }

            dispatched.map(|rows| (merged, rows))
        })?;

        let outcome = self.freeze(columns, states, rows_sampled);
        info!(
            "Inferred {} columns from {} rows",
            outcome.schema.len(),
            outcome.rows_sampled
        );
        Ok(outcome)
    }

    /// Infer a schema on the blocking pool
    pub async fn infer<R>(&self, reader: R, cancel: CancellationToken) -> Result<InferenceOutcome>
    where
        R: Read + Send + 'static,
    {
        let inferrer = self.clone();
        tokio::task::spawn_blocking(move || inferrer.infer_reader(reader, &cancel))
            .await
            .map_err(|e| Error::Other(format!("Inference task failed: {e}")))?
    }

    /// Infer a schema from a file
    pub async fn infer_path(
        &self,
        path: impl AsRef<Path>,
        cancel: CancellationToken,
    ) -> Result<InferenceOutcome> {
        let file = open_file(path.as_ref())?;
        self.infer(BufReader::new(file), cancel).await
    }

    /// Send sampled rows to the workers in batches
    ///
    /// Consumes the sender so the workers see the channel close on every
    /// return path.
    fn dispatch<I>(
        &self,
        records: I,
        width: usize,
        tx: async_channel::Sender<Vec<StringRecord>>,
        cancel: &CancellationToken,
    ) -> Result<usize>
    where
        I: Iterator<Item = csv::Result<StringRecord>>,
    {
        let max_rows = self.options.max_rows;
        let batch_size = self.options.batch_size;
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = 0usize;

        for record in records.take(max_rows) {
            let record = record?;
            if record.len() != width {
                return Err(Error::RowArity {
                    line: record.position().map_or(0, csv::Position::line),
                    expected: width,
                    found: record.len(),
                });
            }
            batch.push(record);
            rows += 1;

            if batch.len() == batch_size {
                send_batch(&tx, std::mem::take(&mut batch), cancel)?;
            }
        }

        if !batch.is_empty() {
            send_batch(&tx, batch, cancel)?;
        }

        Ok(rows)
    }

    /// Freeze column states into a schema with descriptive metadata
    fn freeze(
        &self,
        columns: Vec<String>,
        states: Vec<ColumnState>,
        rows_sampled: usize,
    ) -> InferenceOutcome {
        let fields = columns
            .into_iter()
            .zip(states)
            .map(|(name, state)| match state.type_tag {
                // Only nulls were seen
                TypeTag::Unset => InferredField::new(name, TypeTag::String, true),
                tag => InferredField::new(name, tag, state.nullable),
            })
            .collect();

        let schema = InferredSchema::new(fields)
            .with_metadata(META_DELIMITER, self.options.delimiter_char().to_string())
            .with_metadata(META_HAS_HEADER, self.options.has_header.to_string())
            .with_metadata(META_SAMPLE_SIZE, rows_sampled.to_string())
            .with_metadata(META_INFERRED_AT, Utc::now().to_rfc3339());

        InferenceOutcome {
            schema,
            rows_sampled,
        }
    }
}

fn send_batch(
    tx: &async_channel::Sender<Vec<StringRecord>>,
    batch: Vec<StringRecord>,
    cancel: &CancellationToken,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tx.send_blocking(batch)
        .map_err(|_| Error::Other("Inference workers exited early".to_string()))
}

fn run_worker(
    worker_id: usize,
    rx: &async_channel::Receiver<Vec<StringRecord>>,
    width: usize,
    detector: &ValueDetector<'_>,
) -> Vec<ColumnState> {
    let mut states = vec![ColumnState::default(); width];
    let mut rows = 0usize;

    while let Ok(batch) = rx.recv_blocking() {
        for record in &batch {
            for (state, value) in states.iter_mut().zip(record.iter()) {
                state.observe(detector.detect(value));
            }
        }
        rows += batch.len();
    }

    debug!("Inference worker {worker_id} processed {rows} rows");
    states
}

pub(crate) fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: path.display().to_string(),
        },
        _ => Error::Io(e),
    })
}

// ============================================================================
// Value detection
// ============================================================================

/// Classifies raw text values under a set of inference options
#[derive(Debug)]
pub(crate) struct ValueDetector<'a> {
    options: &'a InferenceOptions,
}

impl<'a> ValueDetector<'a> {
    pub(crate) fn new(options: &'a InferenceOptions) -> Self {
        Self { options }
    }

    /// Detect the type of a raw value; `None` means null
    ///
    /// Order: null sentinel, integer, float, boolean, timestamp, string.
    pub(crate) fn detect(&self, raw: &str) -> Option<TypeTag> {
        if self.options.is_null(raw) {
            return None;
        }
        let value = raw.trim();

        if value.parse::<i64>().is_ok() {
            return Some(TypeTag::Int64);
        }
        if value.parse::<f64>().is_ok() {
            return Some(TypeTag::Float64);
        }
        if parse_bool(value).is_some() {
            return Some(TypeTag::Boolean);
        }
        if let Some(format) = &self.options.timestamp_format {
            if parse_timestamp(value, format).is_some() {
                return Some(TypeTag::Timestamp);
            }
        }
        Some(TypeTag::String)
    }
}

/// Parse a boolean literal (`1`/`0` are claimed by the integer parse first)
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" => Some(true),
        "0" => Some(false),
        v if v.eq_ignore_ascii_case("true") => Some(true),
        v if v.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Parse a timestamp with a chrono format string into microseconds since epoch
///
/// Formats with an offset are normalized to UTC; formats without a time
/// component resolve to midnight.
pub(crate) fn parse_timestamp(value: &str, format: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_str(value, format) {
        return Some(dt.with_timezone(&Utc).timestamp_micros());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
        return Some(naive.and_utc().timestamp_micros());
    }
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_micros())
}
