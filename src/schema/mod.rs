//! Schema inference module
//!
//! Infers a typed schema from delimited text before a transfer begins.
//!
//! # Features
//!
//! - **Type Detection**: integer, float, boolean and (optionally) timestamp values
//! - **Type Widening**: `Int64` widens to `Float64`; any other conflict widens to `String`
//! - **Null Sentinels**: configurable null markers mark a column nullable
//! - **Bounded Sampling**: at most `max_rows` rows are examined
//! - **Worker Pool**: rows are classified by a pool sized to available parallelism

mod inference;
mod types;

pub(crate) use inference::{open_file, parse_bool, parse_timestamp};
pub use inference::{InferenceOutcome, SchemaInferrer};
pub use types::{
    ColumnState, InferenceOptions, InferredField, InferredSchema, TypeTag, DEFAULT_DELIMITER,
    META_DELIMITER, META_HAS_HEADER, META_INFERRED_AT, META_SAMPLE_SIZE,
};
