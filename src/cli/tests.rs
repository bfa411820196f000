//! Tests for CLI module

use super::runner::pipeline_config;
use super::*;
use crate::schema::InferenceOptions;
use crate::types::DataFormat;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

fn convert_args(argv: &[&str]) -> ConvertArgs {
    let cli = Cli::try_parse_from(argv.iter().copied()).unwrap();
    match cli.command {
        Commands::Convert(args) => args,
        Commands::Infer(_) => panic!("expected convert"),
    }
}

#[test]
fn test_parse_infer() {
    let cli = Cli::try_parse_from([
        "batchflow",
        "-v",
        "infer",
        "data.csv",
        "--delimiter",
        ";",
        "--no-header",
        "--null",
        "NA",
        "--null",
        "n/a",
        "--max-rows",
        "50",
        "--workers",
        "2",
    ])
    .unwrap();
    assert!(cli.verbose);

    let Commands::Infer(args) = cli.command else {
        panic!("expected infer");
    };
    assert_eq!(args.path, PathBuf::from("data.csv"));

    let options = args.inference.apply(InferenceOptions::default());
    assert_eq!(options.delimiter, Some(';'));
    assert!(!options.has_header);
    assert_eq!(options.null_values, vec!["NA", "n/a"]);
    assert!(options.empty_as_null);
    assert_eq!(options.max_rows, 50);
    assert_eq!(options.workers, Some(2));
}

#[test]
fn test_inference_args_leave_unset_options_alone() {
    let base = InferenceOptions::default()
        .with_null_value("NULL")
        .with_timestamp_format("%Y");
    let options = InferenceArgs::default().apply(base.clone());
    assert_eq!(options, base);
}

#[test]
fn test_parse_convert() {
    let args = convert_args(&[
        "batchflow",
        "convert",
        "in.csv",
        "out.dat",
        "--to",
        "parquet",
        "--queue-capacity",
        "4",
        "--keep-empty",
    ]);
    assert_eq!(args.to, Some(DataFormat::Parquet));

    let config = pipeline_config(&args).unwrap();
    assert_eq!(config.source.path, PathBuf::from("in.csv"));
    assert_eq!(config.sink.resolve_format().unwrap(), DataFormat::Parquet);
    assert_eq!(config.transfer.queue_capacity, 4);
    assert!(!config.inference.empty_as_null);
}

#[test]
fn test_parse_convert_rejects_unknown_format() {
    let result = Cli::try_parse_from(["batchflow", "convert", "a.csv", "b.csv", "--from", "xls"]);
    assert!(result.is_err());
}

#[test]
fn test_convert_needs_endpoints() {
    let args = convert_args(&["batchflow", "convert", "only-input.csv"]);
    assert!(pipeline_config(&args).unwrap_err().is_validation());
}

#[test]
fn test_convert_zero_capacity_is_rejected() {
    let args = convert_args(&["batchflow", "convert", "a.csv", "b.parquet", "--queue-capacity", "0"]);
    assert!(pipeline_config(&args).unwrap_err().is_validation());
}

#[test]
fn test_convert_flags_override_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source:\n  path: a.csv\nsink:\n  path: b.parquet").unwrap();
    writeln!(file, "transfer:\n  queue_capacity: 7\n  progress_interval: 3").unwrap();
    let config_path = file.path().to_str().unwrap().to_string();

    let from_file = pipeline_config(&convert_args(&[
        "batchflow",
        "convert",
        "--config",
        config_path.as_str(),
    ]))
    .unwrap();
    assert_eq!(from_file.sink.path, PathBuf::from("b.parquet"));
    assert_eq!(from_file.transfer.queue_capacity, 7);

    let overridden = pipeline_config(&convert_args(&[
        "batchflow",
        "convert",
        "other.csv",
        "other.arrow",
        "--config",
        config_path.as_str(),
        "--queue-capacity",
        "2",
    ]))
    .unwrap();
    assert_eq!(overridden.source.path, PathBuf::from("other.csv"));
    assert_eq!(overridden.sink.resolve_format().unwrap(), DataFormat::Ipc);
    assert_eq!(overridden.transfer.queue_capacity, 2);
    assert_eq!(overridden.transfer.progress_interval, 3);
}
