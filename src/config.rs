//! Pipeline configuration
//!
//! A pipeline names one source file, one sink file and the options used to
//! read, transfer and write between them. Configs are loaded from YAML or
//! built in code:
//!
//! ```yaml
//! source:
//!   path: data/events.csv
//! sink:
//!   path: out/events.parquet
//! inference:
//!   null_values: ["NA"]
//!   max_rows: 5000
//! transfer:
//!   queue_capacity: 32
//! parquet:
//!   compression: zstd
//! ```

use crate::engine::TransferConfig;
use crate::error::{Error, Result};
use crate::schema::InferenceOptions;
use crate::sink::ParquetSinkOptions;
use crate::types::DataFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Endpoint Config
// ============================================================================

/// One end of a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// File path
    pub path: PathBuf,

    /// Explicit format; detected from the extension when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<DataFormat>,
}

impl EndpointConfig {
    /// Create an endpoint for a path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    /// Set an explicit format
    #[must_use]
    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Explicit format, or the one implied by the path
    pub fn resolve_format(&self) -> Result<DataFormat> {
        match self.format {
            Some(format) => Ok(format),
            None => DataFormat::from_path(&self.path),
        }
    }
}

// ============================================================================
// Pipeline Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where batches come from
    pub source: EndpointConfig,

    /// Where batches go
    pub sink: EndpointConfig,

    /// Schema inference for delimited sources
    #[serde(default)]
    pub inference: InferenceOptions,

    /// Transfer engine settings
    #[serde(default)]
    pub transfer: TransferConfig,

    /// Parquet writer settings
    #[serde(default)]
    pub parquet: ParquetSinkOptions,
}

impl PipelineConfig {
    /// Create a config with default options
    pub fn new(source: EndpointConfig, sink: EndpointConfig) -> Self {
        Self {
            source,
            sink,
            inference: InferenceOptions::default(),
            transfer: TransferConfig::default(),
            parquet: ParquetSinkOptions::default(),
        }
    }

    /// Set inference options
    #[must_use]
    pub fn with_inference(mut self, inference: InferenceOptions) -> Self {
        self.inference = inference;
        self
    }

    /// Set transfer config
    #[must_use]
    pub fn with_transfer(mut self, transfer: TransferConfig) -> Self {
        self.transfer = transfer;
        self
    }

    /// Set Parquet options
    #[must_use]
    pub fn with_parquet(mut self, parquet: ParquetSinkOptions) -> Self {
        self.parquet = parquet;
        self
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.source.resolve_format()?;
        self.sink.resolve_format()?;

        if self.source.path == self.sink.path {
            return Err(Error::validation(format!(
                "Source and sink are the same file: {}",
                self.source.path.display()
            )));
        }

        self.inference.validate()?;
        self.transfer.validate()?;

        if self.parquet.row_group_size == 0 {
            return Err(Error::validation("parquet.row_group_size must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ParquetCompression;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const FULL_YAML: &str = r#"
source:
  path: data/events.tsv
sink:
  path: out/events.parquet
inference:
  delimiter: "\t"
  null_values: ["NA", "-"]
  max_rows: 5000
transfer:
  queue_capacity: 32
  progress_interval: 10
parquet:
  compression: zstd
"#;

    #[test]
    fn test_parse_full_config() {
        let config = PipelineConfig::from_yaml_str(FULL_YAML).unwrap();

        assert_eq!(config.source.path, PathBuf::from("data/events.tsv"));
        assert_eq!(config.source.resolve_format().unwrap(), DataFormat::Csv);
        assert_eq!(config.sink.resolve_format().unwrap(), DataFormat::Parquet);
        assert_eq!(config.inference.delimiter, Some('\t'));
        assert_eq!(config.inference.null_values, vec!["NA", "-"]);
        assert_eq!(config.inference.max_rows, 5000);
        assert!(config.inference.has_header);
        assert_eq!(config.transfer.queue_capacity, 32);
        assert_eq!(config.transfer.progress_interval, 10);
        assert_eq!(config.parquet.compression, ParquetCompression::Zstd);
    }

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config =
            PipelineConfig::from_yaml_str("source:\n  path: a.csv\nsink:\n  path: b.arrow\n")
                .unwrap();

        assert_eq!(config.inference, InferenceOptions::default());
        assert_eq!(config.transfer, TransferConfig::default());
        assert_eq!(config.parquet, ParquetSinkOptions::default());
        assert_eq!(config.sink.resolve_format().unwrap(), DataFormat::Ipc);
    }

    #[test]
    fn test_explicit_format_overrides_extension() {
        let config = PipelineConfig::from_yaml_str(
            "source:\n  path: dump.dat\n  format: ndjson\nsink:\n  path: out.csv\n",
        )
        .unwrap();
        assert_eq!(config.source.resolve_format().unwrap(), DataFormat::Ndjson);
    }

    #[test]
    fn test_validate_rejects_bad_sections() {
        let base = PipelineConfig::new(EndpointConfig::new("in.csv"), EndpointConfig::new("out.parquet"));
        assert!(base.validate().is_ok());

        let same = PipelineConfig::new(EndpointConfig::new("in.csv"), EndpointConfig::new("in.csv"));
        assert!(same.validate().unwrap_err().is_validation());

        let unknown = PipelineConfig::new(EndpointConfig::new("in.xyz"), EndpointConfig::new("out.csv"));
        assert!(unknown.validate().unwrap_err().is_validation());

        let zero_queue = base
            .clone()
            .with_transfer(TransferConfig::new().with_queue_capacity(0));
        assert!(zero_queue.validate().unwrap_err().is_validation());

        let zero_rows = base
            .clone()
            .with_inference(InferenceOptions::default().with_max_rows(0));
        assert!(zero_rows.validate().unwrap_err().is_validation());

        let zero_group = base.with_parquet(ParquetSinkOptions::new().with_row_group_size(0));
        assert!(zero_group.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_malformed_yaml() {
        let err = PipelineConfig::from_yaml_str("source: [").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL_YAML.as_bytes()).unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.transfer.queue_capacity, 32);

        let missing = PipelineConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(missing, Error::FileNotFound { .. }));
    }
}
