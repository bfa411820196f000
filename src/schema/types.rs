//! Schema types

use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Metadata key holding the delimiter used during inference
pub const META_DELIMITER: &str = "delimiter";
/// Metadata key holding whether a header row was present
pub const META_HAS_HEADER: &str = "has_header";
/// Metadata key holding the number of rows sampled
pub const META_SAMPLE_SIZE: &str = "sample_size";
/// Metadata key holding the RFC 3339 inference timestamp
pub const META_INFERRED_AT: &str = "inferred_at";

/// Delimiter used when none is configured
pub const DEFAULT_DELIMITER: char = ',';

/// Inferred column type
///
/// Types form a widening lattice: `Unset` is the bottom, `String` the top,
/// and `Int64` widens to `Float64`. Every other disagreement widens to `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    #[default]
    Unset,
    Boolean,
    Int64,
    Float64,
    Timestamp,
    String,
}

impl TypeTag {
    /// Merge two types, returning the more general type
    ///
    /// Commutative and associative, so the merge order of observations
    /// never changes the result.
    pub fn merge_with(self, other: TypeTag) -> TypeTag {
        match (self, other) {
            (TypeTag::Unset, other) | (other, TypeTag::Unset) => other,
            (a, b) if a == b => a,
            (TypeTag::Int64, TypeTag::Float64) | (TypeTag::Float64, TypeTag::Int64) => {
                TypeTag::Float64
            }
            // Incompatible types - fall back to string
            _ => TypeTag::String,
        }
    }

    /// Arrow data type for this tag (`Unset` resolves to Utf8)
    pub fn to_arrow(self) -> DataType {
        match self {
            TypeTag::Boolean => DataType::Boolean,
            TypeTag::Int64 => DataType::Int64,
            TypeTag::Float64 => DataType::Float64,
            TypeTag::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
            TypeTag::String | TypeTag::Unset => DataType::Utf8,
        }
    }

    /// Map an Arrow data type back to a tag, if it has one
    pub fn from_arrow(data_type: &DataType) -> Option<TypeTag> {
        match data_type {
            DataType::Boolean => Some(TypeTag::Boolean),
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
                Some(TypeTag::Int64)
            }
            DataType::Float16 | DataType::Float32 | DataType::Float64 => Some(TypeTag::Float64),
            DataType::Timestamp(_, _) => Some(TypeTag::Timestamp),
            DataType::Utf8 | DataType::LargeUtf8 => Some(TypeTag::String),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Unset => write!(f, "unset"),
            TypeTag::Boolean => write!(f, "boolean"),
            TypeTag::Int64 => write!(f, "int64"),
            TypeTag::Float64 => write!(f, "float64"),
            TypeTag::Timestamp => write!(f, "timestamp"),
            TypeTag::String => write!(f, "string"),
        }
    }
}

/// Per-column inference state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnState {
    /// Widest type observed so far
    pub type_tag: TypeTag,
    /// Whether a null sentinel was observed
    pub nullable: bool,
}

impl ColumnState {
    /// Record one detected value; `None` is a null
    pub fn observe(&mut self, detected: Option<TypeTag>) {
        match detected {
            Some(tag) => self.type_tag = self.type_tag.merge_with(tag),
            None => self.nullable = true,
        }
    }

    /// Fold another state for the same column into this one
    pub fn merge(&mut self, other: &ColumnState) {
        self.type_tag = self.type_tag.merge_with(other.type_tag);
        self.nullable |= other.nullable;
    }
}

/// A named, typed, nullable column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredField {
    /// Column name
    pub name: String,
    /// Column type
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    /// Whether the column may contain nulls
    #[serde(default)]
    pub nullable: bool,
}

impl InferredField {
    /// Create a new field
    pub fn new(name: impl Into<String>, type_tag: TypeTag, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_tag,
            nullable,
        }
    }

    /// Build the equivalent Arrow field
    pub fn to_arrow(&self) -> Field {
        Field::new(&self.name, self.type_tag.to_arrow(), self.nullable)
    }
}

/// Ordered set of inferred fields plus descriptive metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InferredSchema {
    /// Fields in column order
    pub fields: Vec<InferredField>,
    /// Descriptive metadata (delimiter, header flag, sample size, timestamp)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl InferredSchema {
    /// Create a schema from fields
    pub fn new(fields: Vec<InferredField>) -> Self {
        Self {
            fields,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&InferredField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Build the equivalent Arrow schema, carrying metadata along
    pub fn to_arrow(&self) -> Schema {
        let fields: Vec<Field> = self.fields.iter().map(InferredField::to_arrow).collect();
        let metadata: HashMap<String, String> = self
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Schema::new_with_metadata(fields, metadata)
    }

    /// Build a shared Arrow schema
    pub fn to_arrow_ref(&self) -> Arc<Schema> {
        Arc::new(self.to_arrow())
    }

    /// Recover an inferred schema from an Arrow schema
    ///
    /// Fails on Arrow types with no inference counterpart (lists, structs, ...).
    pub fn from_arrow(schema: &Schema) -> Result<Self> {
        let fields = schema
            .fields()
            .iter()
            .map(|field| {
                let type_tag = TypeTag::from_arrow(field.data_type()).ok_or_else(|| {
                    Error::schema(format!(
                        "Column '{}' has unsupported type {}",
                        field.name(),
                        field.data_type()
                    ))
                })?;
                Ok(InferredField::new(field.name(), type_tag, field.is_nullable()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            fields,
            metadata: schema
                .metadata()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }
}

// ============================================================================
// Options
// ============================================================================

/// Options recognized by the schema inferrer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceOptions {
    /// Field delimiter (single ASCII character); comma when unset
    pub delimiter: Option<char>,
    /// Whether the first row is a header
    pub has_header: bool,
    /// Values treated as null (exact match)
    pub null_values: Vec<String>,
    /// Whether empty or blank values count as null
    pub empty_as_null: bool,
    /// chrono format string for timestamp detection; no detection when unset
    pub timestamp_format: Option<String>,
    /// Maximum number of data rows to sample
    pub max_rows: usize,
    /// Rows handed to a worker at a time
    pub batch_size: usize,
    /// Worker count; defaults to available parallelism
    pub workers: Option<usize>,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            null_values: Vec::new(),
            empty_as_null: true,
            timestamp_format: None,
            max_rows: 1000,
            batch_size: 100,
            workers: None,
        }
    }
}

impl InferenceOptions {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Set whether the first row is a header
    #[must_use]
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Add a null sentinel
    #[must_use]
    pub fn with_null_value(mut self, value: impl Into<String>) -> Self {
        self.null_values.push(value.into());
        self
    }

    /// Set whether empty or blank values count as null
    #[must_use]
    pub fn with_empty_as_null(mut self, enabled: bool) -> Self {
        self.empty_as_null = enabled;
        self
    }

    /// Enable timestamp detection with a chrono format string
    #[must_use]
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = Some(format.into());
        self
    }

    /// Set the sampling cap
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Set the per-worker batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the worker count
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Resolved worker count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Configured delimiter, or the default comma
    pub fn delimiter_char(&self) -> char {
        self.delimiter.unwrap_or(DEFAULT_DELIMITER)
    }

    /// Delimiter as the byte the CSV parser expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        let delimiter = self.delimiter_char();
        u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                Error::validation(format!(
                    "Delimiter must be a single ASCII character, got {delimiter:?}"
                ))
            })
    }

    /// Check the options before any work starts
    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        if self.max_rows == 0 {
            return Err(Error::validation("max_rows must be positive"));
        }
        if self.batch_size == 0 {
            return Err(Error::validation("batch_size must be positive"));
        }
        if self.workers == Some(0) {
            return Err(Error::validation("workers must be positive"));
        }
        Ok(())
    }

    /// Whether a raw value is a null under these options
    pub fn is_null(&self, raw: &str) -> bool {
        if self.null_values.iter().any(|n| n == raw) {
            return true;
        }
        self.empty_as_null && raw.trim().is_empty()
    }

    /// CSV reader configured for these options (header handled by the caller)
    pub(crate) fn csv_reader<R: std::io::Read>(&self, reader: R) -> Result<csv::Reader<R>> {
        Ok(csv::ReaderBuilder::new()
            .delimiter(self.delimiter_byte()?)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader))
    }
}
