//! CLI commands and argument parsing

use crate::schema::InferenceOptions;
use crate::types::DataFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Batch transfer and schema inference CLI
#[derive(Parser, Debug)]
#[command(name = "batchflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Infer a typed schema from delimited text and print it as JSON
    Infer(InferArgs),

    /// Copy a file into another format
    Convert(ConvertArgs),
}

/// Arguments for `infer`
#[derive(Args, Debug)]
pub struct InferArgs {
    /// Delimited text file
    pub path: PathBuf,

    #[command(flatten)]
    pub inference: InferenceArgs,
}

/// Arguments for `convert`
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input file (overrides the config file's source)
    pub input: Option<PathBuf>,

    /// Output file (overrides the config file's sink)
    pub output: Option<PathBuf>,

    /// Input format (default: from the extension)
    #[arg(long)]
    pub from: Option<DataFormat>,

    /// Output format (default: from the extension)
    #[arg(long)]
    pub to: Option<DataFormat>,

    /// Batches buffered between reader and writer
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Log progress every N batches
    #[arg(long)]
    pub progress_interval: Option<usize>,

    /// Pipeline config file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub inference: InferenceArgs,
}

/// Inference flags shared by `infer` and `convert`
#[derive(Args, Debug, Clone, Default)]
pub struct InferenceArgs {
    /// Field delimiter (default ',' or tab for .tsv)
    #[arg(short, long)]
    pub delimiter: Option<char>,

    /// The first row is data, not a header
    #[arg(long)]
    pub no_header: bool,

    /// Treat VALUE as null (repeatable)
    #[arg(long = "null", value_name = "VALUE")]
    pub null_values: Vec<String>,

    /// Keep empty fields as empty strings instead of nulls
    #[arg(long)]
    pub keep_empty: bool,

    /// chrono format string for timestamp columns
    #[arg(long)]
    pub timestamp_format: Option<String>,

    /// Maximum rows to sample
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// Worker threads (default: available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,
}

impl InferenceArgs {
    /// Layer the flags that were given over `options`
    pub fn apply(&self, mut options: InferenceOptions) -> InferenceOptions {
        if let Some(delimiter) = self.delimiter {
            options.delimiter = Some(delimiter);
        }
        if self.no_header {
            options.has_header = false;
        }
        options.null_values.extend(self.null_values.iter().cloned());
        if self.keep_empty {
            options.empty_as_null = false;
        }
        if let Some(format) = &self.timestamp_format {
            options.timestamp_format = Some(format.clone());
        }
        if let Some(max_rows) = self.max_rows {
            options.max_rows = max_rows;
        }
        if let Some(workers) = self.workers {
            options.workers = Some(workers);
        }
        options
    }
}
