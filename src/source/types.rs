//! Source trait and in-memory source

use crate::error::{Error, Result};
use crate::types::{Batch, SchemaRef};
use async_trait::async_trait;
use std::collections::VecDeque;

/// Produces a sequence of batches sharing one schema
#[async_trait]
pub trait Source: Send {
    /// Read the next batch; `Ok(None)` marks the end of the stream
    async fn read(&mut self) -> Result<Option<Batch>>;

    /// Schema of every batch this source yields
    fn schema(&self) -> SchemaRef;

    /// Release underlying resources (idempotent)
    async fn close(&mut self) -> Result<()>;
}

/// Source over batches already held in memory
#[derive(Debug)]
pub struct MemorySource {
    schema: SchemaRef,
    batches: VecDeque<Batch>,
    closed: bool,
}

impl MemorySource {
    /// Create a source yielding `batches` in order
    ///
    /// Every batch must carry `schema`.
    pub fn new(schema: SchemaRef, batches: Vec<Batch>) -> Result<Self> {
        if let Some(batch) = batches.iter().find(|b| b.schema() != schema) {
            return Err(Error::schema(format!(
                "Batch schema {:?} does not match source schema {:?}",
                batch.schema(),
                schema
            )));
        }
        Ok(Self {
            schema,
            batches: batches.into(),
            closed: false,
        })
    }

    /// Create a source from non-empty batches, taking the schema of the first
    pub fn from_batches(batches: Vec<Batch>) -> Result<Self> {
        let schema = batches
            .first()
            .map(Batch::schema)
            .ok_or_else(|| Error::source("No batches to read"))?;
        Self::new(schema, batches)
    }

    /// Batches not yet read
    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

#[async_trait]
impl Source for MemorySource {
    async fn read(&mut self) -> Result<Option<Batch>> {
        if self.closed {
            return Err(Error::source("Read from closed memory source"));
        }
        Ok(self.batches.pop_front())
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.batches.clear();
        Ok(())
    }
}
