//! Error types for batchflow
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use std::fmt;
use thiserror::Error;

/// Pipeline stage that produced a recorded failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The worker reading batches from the source
    Pull,
    /// The worker writing batches to the sink
    Push,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Pull => write!(f, "puller"),
            Stage::Push => write!(f, "pusher"),
        }
    }
}

/// The main error type for batchflow
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Validation Errors
    // ============================================================================
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Source error: {message}")]
    Source { message: String },

    #[error("Sink error: {message}")]
    Sink { message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Row {line} has {found} columns, expected {expected}")]
    RowArity {
        line: u64,
        expected: usize,
        found: usize,
    },

    // ============================================================================
    // Pipeline Errors
    // ============================================================================
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Transfer failed in {stage}: {source}")]
    Pipeline {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a source error
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Wrap an error recorded by a pipeline worker
    pub fn pipeline(stage: Stage, source: Error) -> Self {
        Self::Pipeline {
            stage,
            source: Box::new(source),
        }
    }

    /// Check if this error (or the error it wraps) is a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::Pipeline { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Check if this is a configuration/validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// The pipeline stage that failed, if this error came out of a transfer worker
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Pipeline { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias for batchflow
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("queue capacity must be positive");
        assert_eq!(
            err.to_string(),
            "Validation error: queue capacity must be positive"
        );

        let err = Error::RowArity {
            line: 4,
            expected: 3,
            found: 2,
        };
        assert_eq!(err.to_string(), "Row 4 has 2 columns, expected 3");

        let err = Error::pipeline(Stage::Pull, Error::source("disk gone"));
        assert_eq!(
            err.to_string(),
            "Transfer failed in puller: Source error: disk gone"
        );
    }

    #[test]
    fn test_is_cancelled() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(Error::pipeline(Stage::Push, Error::Cancelled).is_cancelled());
        assert!(!Error::sink("full").is_cancelled());
        assert!(!Error::pipeline(Stage::Push, Error::sink("full")).is_cancelled());
    }

    #[test]
    fn test_stage() {
        let err = Error::pipeline(Stage::Push, Error::sink("full"));
        assert_eq!(err.stage(), Some(Stage::Push));
        assert_eq!(Error::Cancelled.stage(), None);
        assert!(Error::validation("x").is_validation());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::validation("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Validation error: inner"));
    }
}
