//! CLI module
//!
//! Command-line interface for inference and transfers.
//!
//! # Commands
//!
//! - `infer` - Print the schema inferred from a delimited file
//! - `convert` - Copy a file into another format through the transfer engine

mod commands;
mod runner;

pub use commands::{Cli, Commands, ConvertArgs, InferArgs, InferenceArgs};
pub use runner::Runner;

#[cfg(test)]
mod tests;
