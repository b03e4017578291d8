//! Command-line interface

pub mod commands;
pub mod output;
pub mod terminal_output;

use clap::{Parser, Subcommand};
use commands::{GenerateCommand, RunCommand, StepsCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Image-conditioned robot design workflow powered by a streaming multimodal model
#[derive(Debug, Parser, Clone)]
#[command(name = "robogen")]
#[command(author = "RoboGen Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Run image-conditioned generation workflow steps", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config.json
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print generated text as it streams in
    #[arg(short, long, global = true)]
    pub stream: bool,

    /// Directory for generated files (overrides config)
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a workflow step
    Run(RunCommand),

    /// Run an ad-hoc prompt
    Generate(GenerateCommand),

    /// List workflow steps
    Steps(StepsCommand),

    /// Validate a step definition file
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
