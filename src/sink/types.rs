//! Sink trait and in-memory sink

use crate::error::{Error, Result};
use crate::types::Batch;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// Consumes batches one at a time
#[async_trait]
pub trait Sink: Send {
    /// Write one batch; the sink owns it from here on
    async fn write(&mut self, batch: Batch) -> Result<()>;

    /// Flush and release underlying resources (idempotent)
    async fn close(&mut self) -> Result<()>;
}

/// Shared view of the batches collected by a `MemorySink`
#[derive(Debug, Clone, Default)]
pub struct MemorySinkHandle {
    batches: Arc<Mutex<Vec<Batch>>>,
}

impl MemorySinkHandle {
    /// Snapshot of the collected batches, in write order
    pub fn batches(&self) -> Vec<Batch> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Total rows collected
    pub fn rows(&self) -> usize {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(Batch::num_rows)
            .sum()
    }

    fn push(&self, batch: Batch) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch);
    }
}

/// Sink collecting batches in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    handle: MemorySinkHandle,
    closed: bool,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for reading the collected batches after the sink is moved away
    pub fn handle(&self) -> MemorySinkHandle {
        self.handle.clone()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn write(&mut self, batch: Batch) -> Result<()> {
        if self.closed {
            return Err(Error::sink("Write to closed memory sink"));
        }
        self.handle.push(batch);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
