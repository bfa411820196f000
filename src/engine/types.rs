//! Engine types
//!
//! Configuration, metrics and lifecycle state for the transfer engine.

use crate::error::{Error, Result, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Default bounded queue capacity, in batches
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Configuration for a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Batches buffered between puller and pusher
    pub queue_capacity: usize,
    /// Log progress every N written batches (0 = off)
    pub progress_interval: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            progress_interval: 0,
        }
    }
}

impl TransferConfig {
    /// Create a new transfer config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set queue capacity
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set progress logging interval
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Check the config before any worker starts
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::validation("queue_capacity must be positive"));
        }
        Ok(())
    }
}

/// Lifecycle of a transfer engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    /// Not started
    #[default]
    Idle,
    /// Workers are running
    Running,
    /// Every batch reached the sink
    Completed,
    /// A worker or a close failed
    Failed,
    /// The caller cancelled the transfer
    Cancelled,
}

impl TransferState {
    /// Whether this is a final state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferState::Completed | TransferState::Failed | TransferState::Cancelled
        )
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferState::Idle => write!(f, "idle"),
            TransferState::Running => write!(f, "running"),
            TransferState::Completed => write!(f, "completed"),
            TransferState::Failed => write!(f, "failed"),
            TransferState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Statistics from a transfer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferMetrics {
    /// Batches read from the source
    pub batches_read: usize,
    /// Rows read from the source
    pub rows_read: usize,
    /// Batches accepted by the sink
    pub batches_written: usize,
    /// Rows accepted by the sink
    pub rows_written: usize,
    /// Worker errors logged and dropped after the first one
    pub suppressed_errors: usize,
    /// When the workers were started
    pub started_at: Option<DateTime<Utc>>,
    /// When the source and sink were closed
    pub finished_at: Option<DateTime<Utc>>,
}

impl TransferMetrics {
    /// Metrics stamped with the current time as start
    pub fn started() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Stamp the end time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, once finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    /// Written rows per second, once finished
    pub fn rows_per_second(&self) -> Option<f64> {
        let millis = self.duration()?.num_milliseconds().max(1);
        Some(self.rows_written as f64 * 1000.0 / millis as f64)
    }
}

/// Single-slot error holder shared by the two workers
///
/// The first recorded error is kept; later ones are logged and counted.
#[derive(Debug, Default)]
pub(crate) struct FirstError {
    slot: Mutex<Option<(Stage, Error)>>,
    suppressed: AtomicUsize,
}

impl FirstError {
    /// Record an error; returns true if it was the first
    pub(crate) fn record(&self, stage: Stage, error: Error) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some((stage, error));
            return true;
        }
        drop(slot);

        self.suppressed.fetch_add(1, Ordering::Relaxed);
        warn!("Suppressed {stage} error after first failure: {error}");
        false
    }

    /// Take the recorded error
    pub(crate) fn take(&self) -> Option<(Stage, Error)> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Errors dropped after the first
    pub(crate) fn suppressed(&self) -> usize {
        self.suppressed.load(Ordering::Relaxed)
    }
}
