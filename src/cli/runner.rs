//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, ConvertArgs, InferArgs};
use crate::config::{EndpointConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::pipeline::{delimited_options, run_pipeline};
use crate::schema::{InferenceOptions, SchemaInferrer};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Infer(args) => self.infer(args).await,
            Commands::Convert(args) => self.convert(args).await,
        }
    }

    /// Print the inferred schema
    async fn infer(&self, args: &InferArgs) -> Result<()> {
        let options = args.inference.apply(InferenceOptions::default());
        let options = delimited_options(&args.path, &options);
        options.validate()?;

        let (cancel, watcher) = cancel_on_interrupt();
        let result = SchemaInferrer::new(options)
            .infer_path(&args.path, cancel)
            .await;
        watcher.abort();

        let outcome = result?;
        println!("{}", serde_json::to_string_pretty(&outcome.schema)?);
        Ok(())
    }

    /// Run a transfer and print its metrics
    async fn convert(&self, args: &ConvertArgs) -> Result<()> {
        let config = pipeline_config(args)?;

        let (cancel, watcher) = cancel_on_interrupt();
        let result = run_pipeline(&config, cancel).await;
        watcher.abort();

        let metrics = result?;
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        Ok(())
    }
}

/// Build the pipeline config from a config file and/or flags
///
/// Flags win over the file.
pub(crate) fn pipeline_config(args: &ConvertArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => {
            let (Some(input), Some(output)) = (&args.input, &args.output) else {
                return Err(Error::validation(
                    "convert needs INPUT and OUTPUT, or --config",
                ));
            };
            PipelineConfig::new(EndpointConfig::new(input), EndpointConfig::new(output))
        }
    };

    if let Some(input) = &args.input {
        config.source = EndpointConfig::new(input);
    }
    if let Some(output) = &args.output {
        config.sink = EndpointConfig::new(output);
    }
    if let Some(format) = args.from {
        config.source.format = Some(format);
    }
    if let Some(format) = args.to {
        config.sink.format = Some(format);
    }
    if let Some(capacity) = args.queue_capacity {
        config.transfer.queue_capacity = capacity;
    }
    if let Some(interval) = args.progress_interval {
        config.transfer.progress_interval = interval;
    }
    config.inference = args.inference.apply(config.inference);

    config.validate()?;
    Ok(config)
}

/// Token cancelled by Ctrl-C, plus the task watching for it
fn cancel_on_interrupt() -> (CancellationToken, JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            token.cancel();
        }
    });
    (cancel, watcher)
}
